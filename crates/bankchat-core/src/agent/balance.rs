use bankchat_types::agent::{AgentCapability, AgentResponse};
use bankchat_types::intent::names;
use serde_json::json;

use crate::banking::BankingStores;

use super::{AgentContext, BankingAgent, rupees};

/// Reads balances; never mutates anything.
pub struct AccountBalanceAgent {
    capability: AgentCapability,
    stores: BankingStores,
}

impl AccountBalanceAgent {
    pub fn new(stores: BankingStores) -> Self {
        Self {
            capability: AgentCapability::new(
                "AccountBalanceAgent",
                "Shows account balances with masked account numbers",
                &[],
                0.95,
            )
            .with_tools(&["get_balance", "list_accounts"]),
            stores,
        }
    }
}

impl BankingAgent for AccountBalanceAgent {
    fn capability(&self) -> &AgentCapability {
        &self.capability
    }

    fn primary_intent(&self) -> &'static str {
        names::CHECK_BALANCE
    }

    fn intents(&self) -> &[&'static str] {
        &[names::CHECK_BALANCE, "account_balance", "balance_inquiry"]
    }

    fn keywords(&self) -> &[&'static str] {
        &["balance"]
    }

    fn execute(&self, ctx: &AgentContext) -> AgentResponse {
        let mut accounts = match self.stores.accounts.accounts_for(&ctx.user_id) {
            Ok(accounts) => accounts,
            Err(e) => {
                return AgentResponse::reply(
                    self.name(),
                    format!("I couldn't fetch your balance right now ({e}). Please try again."),
                );
            }
        };

        if let Some(number) = ctx.param("account_number") {
            accounts.retain(|a| a.account_number.ends_with(number));
        } else if let Some(kind) = ctx.param("account_type") {
            accounts.retain(|a| a.account_type.eq_ignore_ascii_case(kind));
        }

        if accounts.is_empty() {
            return AgentResponse::reply(self.name(), "I couldn't find a matching active account.");
        }

        let total: f64 = accounts.iter().map(|a| a.balance).sum();
        let mut message = String::from("Here are your account balances:\n");
        for account in &accounts {
            message.push_str(&format!(
                "• {} account {}: {}\n",
                account.account_type,
                account.masked_number(),
                rupees(account.balance)
            ));
        }
        if accounts.len() > 1 {
            message.push_str(&format!("Total balance: {}", rupees(total)));
        }

        let listed: Vec<_> = accounts
            .iter()
            .map(|a| {
                json!({
                    "id": a.id,
                    "account_number": a.masked_number(),
                    "account_type": a.account_type,
                    "balance": a.balance,
                    "currency": a.currency,
                })
            })
            .collect();

        AgentResponse::reply(self.name(), message.trim_end())
            .with_data(json!({ "accounts": listed, "total_balance": total }))
            .with_actions(&["transfer_money", "view_transfers"])
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{broken, ctx, seeded};
    use super::*;

    #[test]
    fn lists_masked_accounts_and_total() {
        let agent = AccountBalanceAgent::new(seeded().1);
        let response = agent.execute(&ctx(names::CHECK_BALANCE, "check my balance", &[]));

        assert!(response.message.contains("XXXXXX7890"));
        assert!(response.message.contains("XXXXXX4321"));
        assert!(!response.message.contains("1234567890"));
        assert!(response.message.contains("Total balance: ₹400000.00"));
        assert_eq!(response.data.unwrap()["total_balance"], 400_000.0);
    }

    #[test]
    fn filters_by_account_type() {
        let agent = AccountBalanceAgent::new(seeded().1);
        let response = agent.execute(&ctx(names::CHECK_BALANCE, "", &[("account_type", "current")]));
        assert!(response.message.contains("₹250000.00"));
        assert!(!response.message.contains("Total balance"));
    }

    #[test]
    fn no_required_params() {
        let agent = AccountBalanceAgent::new(seeded().1);
        assert!(agent.validate(&Default::default()).is_ok());
    }

    #[test]
    fn store_failure_is_a_message() {
        let agent = AccountBalanceAgent::new(broken());
        let response = agent.execute(&ctx(names::CHECK_BALANCE, "", &[]));
        assert!(response.message.contains("couldn't fetch your balance"));
    }
}
