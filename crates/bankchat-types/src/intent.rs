//! Intent classification results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Intent names known to the router.
pub mod names {
    pub const FUND_TRANSFER: &str = "fund_transfer";
    pub const CHECK_BALANCE: &str = "check_balance";
    pub const ADD_PAYEE: &str = "add_payee";
    pub const LOAN_APPLICATION: &str = "loan_application";
    /// Sentinel returned when nothing scores above zero.
    pub const GENERAL: &str = "general";
}

/// The classified purpose of one utterance.
///
/// `confidence` is a routing signal in `[0, 1]`, not a probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub name: String,
    pub confidence: f64,
    #[serde(default)]
    pub entities: BTreeMap<String, String>,
}

impl IntentResult {
    pub fn general() -> Self {
        Self {
            name: names::GENERAL.to_string(),
            confidence: 0.0,
            entities: BTreeMap::new(),
        }
    }

    pub fn is_general(&self) -> bool {
        self.name == names::GENERAL
    }
}
