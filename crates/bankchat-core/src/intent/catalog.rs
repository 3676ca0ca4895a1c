//! Built-in banking intents, in tie-break order.

use bankchat_types::intent::names;

use super::router::IntentPattern;

pub fn banking_intents() -> Result<Vec<IntentPattern>, regex::Error> {
    Ok(vec![
        IntentPattern::new(
            names::FUND_TRANSFER,
            &["transfer money", "send money", "transfer funds", "pay money", "fund transfer"],
            &[
                r"\b(?:transfer|send|pay)\s+(?:(?:rs\.?|inr|₹)\s*)?\d",
                r"\b(?:transfer|send)\b.*\bto\b",
            ],
            &["transfer", "send", "pay", "money"],
        )?,
        IntentPattern::new(
            names::CHECK_BALANCE,
            &[
                "check balance",
                "account balance",
                "show balance",
                "my balance",
                "balance enquiry",
                "how much money",
            ],
            &[r"\b(?:check|show|view|what(?:'s| is))\s+(?:my\s+)?(?:account\s+)?balance\b"],
            &["balance", "account", "check", "show"],
        )?,
        IntentPattern::new(
            names::ADD_PAYEE,
            &["add payee", "new payee", "add beneficiary", "new beneficiary"],
            &[r"\badd\s+(?:a\s+)?(?:new\s+)?(?:payee|beneficiary)\b"],
            &["add", "payee", "beneficiary", "new"],
        )?,
        IntentPattern::new(
            names::LOAN_APPLICATION,
            &[
                "apply for loan",
                "apply for a loan",
                "loan application",
                "need a loan",
                "personal loan",
                "home loan",
                "car loan",
                "education loan",
            ],
            &[r"\bloans?\b"],
            &["loan", "apply", "emi", "borrow"],
        )?,
    ])
}
