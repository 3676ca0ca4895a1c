//! Multi-turn parameter collection as an explicit state machine.
//!
//! A dialog is either waiting for one named parameter or complete. The
//! parameter it waits for is always the first required parameter not yet
//! collected, so questions come out in a stable order.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use super::prompts;

/// Where a dialog stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "param", rename_all = "snake_case")]
pub enum DialogState {
    AwaitingParam(String),
    Complete,
}

/// Parameters collected so far for one pending action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotFillingDialog {
    step_id: String,
    intent_name: String,
    required: Vec<String>,
    collected: BTreeMap<String, String>,
    state: DialogState,
}

impl SlotFillingDialog {
    /// Begin collecting `required` for `intent_name`, seeded with what the
    /// first utterance already supplied.
    pub fn start(
        intent_name: &str,
        known: BTreeMap<String, String>,
        required: &[String],
    ) -> Self {
        let mut dialog = Self {
            step_id: Uuid::now_v7().to_string(),
            intent_name: intent_name.to_string(),
            required: required.to_vec(),
            collected: known.into_iter().filter(|(_, v)| !v.trim().is_empty()).collect(),
            state: DialogState::Complete,
        };
        dialog.recompute();
        dialog
    }

    /// Merge newly extracted entities.
    ///
    /// Values for still-missing required parameters are taken in any order.
    /// Parameters already resolved are never overwritten. Extra entities
    /// that are not required are kept as context if not already present.
    pub fn advance(&mut self, new_entities: &BTreeMap<String, String>) -> &DialogState {
        for (key, value) in new_entities {
            let value = value.trim();
            if value.is_empty() || self.collected.contains_key(key) {
                continue;
            }
            self.collected.insert(key.clone(), value.to_string());
        }
        self.recompute();
        &self.state
    }

    /// Prompt for the parameter being waited on; `None` once complete.
    pub fn next_question(&self) -> Option<String> {
        match &self.state {
            DialogState::AwaitingParam(param) => Some(prompts::question_for(&self.intent_name, param)),
            DialogState::Complete => None,
        }
    }

    /// Required parameters not yet collected, in asking order.
    pub fn missing_params(&self) -> Vec<String> {
        self.required
            .iter()
            .filter(|p| !self.collected.contains_key(p.as_str()))
            .cloned()
            .collect()
    }

    pub fn awaited_param(&self) -> Option<&str> {
        match &self.state {
            DialogState::AwaitingParam(param) => Some(param),
            DialogState::Complete => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == DialogState::Complete
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    pub fn intent_name(&self) -> &str {
        &self.intent_name
    }

    pub fn required_params(&self) -> &[String] {
        &self.required
    }

    pub fn collected_params(&self) -> &BTreeMap<String, String> {
        &self.collected
    }

    /// Consume the dialog, yielding everything collected.
    pub fn into_params(self) -> BTreeMap<String, String> {
        self.collected
    }

    fn recompute(&mut self) {
        self.state = match self
            .required
            .iter()
            .find(|p| !self.collected.contains_key(p.as_str()))
        {
            Some(param) => DialogState::AwaitingParam(param.clone()),
            None => DialogState::Complete,
        };
    }
}
