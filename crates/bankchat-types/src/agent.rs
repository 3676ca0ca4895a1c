//! Agent capability records and per-turn agent responses.

use serde::{Deserialize, Serialize};

/// Static description of what an agent can do.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCapability {
    pub name: String,
    pub description: String,
    /// Parameters the agent needs before it can act, in the order they are asked for.
    pub required_params: Vec<String>,
    pub confidence_weight: f64,
    /// Banking operations the agent can perform.
    #[serde(default)]
    pub tools: Vec<String>,
}

impl AgentCapability {
    pub fn new(name: &str, description: &str, required: &[&str], weight: f64) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required_params: required.iter().map(|p| p.to_string()).collect(),
            confidence_weight: weight,
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: &[&str]) -> Self {
        self.tools = tools.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// What an agent returns for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub message: String,
    pub agent_name: String,
    /// True when the agent cannot act until more parameters arrive.
    pub requires_input: bool,
    /// Ordered list of parameters still missing.
    #[serde(default)]
    pub missing_parameters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl AgentResponse {
    /// A completed response carrying a human-readable message.
    pub fn reply(agent_name: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            agent_name: agent_name.to_string(),
            requires_input: false,
            missing_parameters: Vec::new(),
            data: None,
            actions: Vec::new(),
        }
    }

    /// A response asking for more input.
    pub fn needs_input(agent_name: &str, question: impl Into<String>, missing: Vec<String>) -> Self {
        Self {
            message: question.into(),
            agent_name: agent_name.to_string(),
            requires_input: true,
            missing_parameters: missing,
            data: None,
            actions: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_actions(mut self, actions: &[&str]) -> Self {
        self.actions = actions.iter().map(|a| a.to_string()).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_builder_preserves_param_order() {
        let cap = AgentCapability::new("FundTransferAgent", "moves money", &["amount", "method"], 0.9)
            .with_tools(&["transfer_money"]);
        assert_eq!(cap.required_params, vec!["amount", "method"]);
        assert_eq!(cap.tools, vec!["transfer_money"]);
    }

    #[test]
    fn test_needs_input_sets_flag() {
        let response = AgentResponse::needs_input("X", "How much?", vec!["amount".to_string()]);
        assert!(response.requires_input);
        assert_eq!(response.missing_parameters, vec!["amount"]);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("data").is_none());
    }
}
