//! Agent selection and the validate-then-execute step.

use bankchat_types::agent::{AgentCapability, AgentResponse};
use bankchat_types::error::ChatError;

use crate::banking::BankingStores;
use crate::dialog::prompts;

use super::balance::AccountBalanceAgent;
use super::general::GeneralAgent;
use super::loan::LoanAgent;
use super::payee::AddPayeeAgent;
use super::transfer::FundTransferAgent;
use super::{AgentContext, BankingAgent};

/// Routes a turn to exactly one agent.
///
/// Agents are consulted in registration order; the first whose
/// `can_handle` is true wins. The fallback takes everything else.
pub struct AgentDispatcher {
    agents: Vec<Box<dyn BankingAgent>>,
    fallback: Box<dyn BankingAgent>,
}

impl AgentDispatcher {
    pub fn new(agents: Vec<Box<dyn BankingAgent>>, fallback: Box<dyn BankingAgent>) -> Self {
        Self { agents, fallback }
    }

    /// The banking agents in priority order: add payee, loan, transfer,
    /// balance. Payee comes before transfer so "payee" is never read as "pay".
    pub fn banking(stores: BankingStores) -> Self {
        Self::new(
            vec![
                Box::new(AddPayeeAgent::new(stores.clone())),
                Box::new(LoanAgent::new(stores.clone())),
                Box::new(FundTransferAgent::new(stores.clone())),
                Box::new(AccountBalanceAgent::new(stores)),
            ],
            Box::new(GeneralAgent::new()),
        )
    }

    pub fn select_agent(&self, intent: &str, utterance: &str) -> &dyn BankingAgent {
        self.agents
            .iter()
            .find(|agent| agent.can_handle(intent, utterance))
            .map(|agent| agent.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    /// The agent whose primary intent is `intent`, ignoring keywords.
    pub fn agent_for_intent(&self, intent: &str) -> Option<&dyn BankingAgent> {
        self.agents
            .iter()
            .find(|agent| agent.primary_intent() == intent)
            .map(|agent| agent.as_ref())
    }

    /// Select an agent for the context and run it.
    pub fn process(&self, ctx: &AgentContext) -> AgentResponse {
        let agent = self.select_agent(&ctx.intent, &ctx.utterance);
        self.run(agent, ctx)
    }

    /// Validate parameters and either execute or ask for the first gap.
    pub fn run(&self, agent: &dyn BankingAgent, ctx: &AgentContext) -> AgentResponse {
        match agent.validate(&ctx.parameters) {
            Ok(()) => {
                tracing::debug!(agent = agent.name(), session_id = %ctx.session_id, "executing agent");
                agent.execute(ctx)
            }
            Err(ChatError::ValidationFailed { missing }) => {
                let Some(first) = missing.first() else {
                    return agent.execute(ctx);
                };
                let question = if ctx.param(first).is_some() {
                    prompts::invalid_value_question(agent.primary_intent(), first)
                } else {
                    prompts::question_for(agent.primary_intent(), first)
                };
                AgentResponse::needs_input(agent.name(), question, missing)
            }
            Err(other) => AgentResponse::reply(agent.name(), other.to_string()),
        }
    }

    /// Capabilities of every agent, fallback last.
    pub fn capabilities(&self) -> Vec<AgentCapability> {
        self.agents
            .iter()
            .chain(std::iter::once(&self.fallback))
            .map(|agent| agent.capability().clone())
            .collect()
    }
}

impl std::fmt::Debug for AgentDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.agents.iter().map(|a| a.name()).collect();
        f.debug_struct("AgentDispatcher")
            .field("agents", &names)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use bankchat_types::intent::names;

    use super::super::test_support::{ctx, seeded};
    use super::*;

    fn dispatcher() -> AgentDispatcher {
        AgentDispatcher::banking(seeded().1)
    }

    #[test]
    fn exact_intent_selects_agent() {
        let d = dispatcher();
        assert_eq!(d.select_agent(names::FUND_TRANSFER, "transfer 500").name(), "FundTransferAgent");
        assert_eq!(d.select_agent(names::CHECK_BALANCE, "balance").name(), "AccountBalanceAgent");
    }

    #[test]
    fn priority_order_is_fixed() {
        let d = dispatcher();
        // Both the payee and transfer agents could claim this.
        let agent = d.select_agent(names::FUND_TRANSFER, "add payee and transfer money");
        assert_eq!(agent.name(), "AddPayeeAgent");
    }

    #[test]
    fn unknown_intent_falls_back_to_general() {
        let d = dispatcher();
        assert_eq!(d.select_agent(names::GENERAL, "hello there").name(), "GeneralAgent");
    }

    #[test]
    fn missing_params_ask_first_question() {
        let d = dispatcher();
        let response = d.process(&ctx(names::FUND_TRANSFER, "transfer money", &[]));
        assert!(response.requires_input);
        assert_eq!(response.missing_parameters, vec!["amount", "method"]);
        assert_eq!(response.message, "How much would you like to transfer?");
    }

    #[test]
    fn invalid_value_gets_invalid_question() {
        let d = dispatcher();
        let response = d.process(&ctx(
            names::FUND_TRANSFER,
            "transfer",
            &[("amount", "500"), ("method", "swift")],
        ));
        assert!(response.requires_input);
        assert_eq!(response.missing_parameters, vec!["method"]);
        assert!(response.message.contains("UPI, IMPS, NEFT or RTGS"));
    }

    #[test]
    fn capabilities_list_fallback_last() {
        let caps = dispatcher().capabilities();
        assert_eq!(caps.len(), 5);
        assert_eq!(caps[0].name, "AddPayeeAgent");
        assert_eq!(caps[4].name, "GeneralAgent");
    }

    #[test]
    fn agent_for_intent_ignores_keywords() {
        let d = dispatcher();
        assert_eq!(d.agent_for_intent(names::ADD_PAYEE).unwrap().name(), "AddPayeeAgent");
        assert!(d.agent_for_intent(names::GENERAL).is_none());
    }
}
