use bankchat_types::agent::{AgentCapability, AgentResponse};
use bankchat_types::intent::names;

use super::{AgentContext, BankingAgent};

const HELP: &str = "I can help you with:\n\
• Checking your account balance\n\
• Transferring money via UPI, IMPS, NEFT or RTGS\n\
• Adding a new payee\n\
• Loan information, EMI calculation and applications\n\
What would you like to do?";

/// Fallback for anything no banking agent claims.
pub struct GeneralAgent {
    capability: AgentCapability,
}

impl GeneralAgent {
    pub fn new() -> Self {
        Self {
            capability: AgentCapability::new(
                "GeneralAgent",
                "Greetings, help and small talk",
                &[],
                0.5,
            ),
        }
    }
}

impl Default for GeneralAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl BankingAgent for GeneralAgent {
    fn capability(&self) -> &AgentCapability {
        &self.capability
    }

    fn primary_intent(&self) -> &'static str {
        names::GENERAL
    }

    fn intents(&self) -> &[&'static str] {
        &[names::GENERAL]
    }

    fn keywords(&self) -> &[&'static str] {
        &["help", "hello", "thank", "bye"]
    }

    fn execute(&self, ctx: &AgentContext) -> AgentResponse {
        let lower = ctx.utterance.to_lowercase();
        let message = if lower.contains("thank") {
            "You're welcome! Is there anything else I can help you with?"
        } else if lower.contains("bye") {
            "Goodbye! Have a great day."
        } else {
            HELP
        };
        AgentResponse::reply(self.name(), message)
            .with_actions(&["check_balance", "transfer_money", "add_payee", "loan_info"])
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::ctx;
    use super::*;

    #[test]
    fn help_lists_capabilities() {
        let response = GeneralAgent::new().execute(&ctx(names::GENERAL, "help", &[]));
        assert!(response.message.contains("Adding a new payee"));
    }

    #[test]
    fn thanks_and_goodbye() {
        let agent = GeneralAgent::new();
        assert!(agent.execute(&ctx(names::GENERAL, "Thanks!", &[])).message.starts_with("You're welcome"));
        assert!(agent.execute(&ctx(names::GENERAL, "ok bye", &[])).message.starts_with("Goodbye"));
    }
}
