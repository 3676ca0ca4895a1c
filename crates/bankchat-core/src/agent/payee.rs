//! Registering a new beneficiary.

use bankchat_types::agent::{AgentCapability, AgentResponse};
use bankchat_types::banking::{Payee, mask_account_number};
use bankchat_types::error::StoreError;
use bankchat_types::intent::names;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::banking::BankingStores;
use crate::banking::validate::{bank_name, is_valid_account_number, is_valid_ifsc};

use super::{AgentContext, BankingAgent};

const MAX_NAME_LEN: usize = 100;

pub struct AddPayeeAgent {
    capability: AgentCapability,
    stores: BankingStores,
}

impl AddPayeeAgent {
    pub fn new(stores: BankingStores) -> Self {
        Self {
            capability: AgentCapability::new(
                "AddPayeeAgent",
                "Adds a payee after validating the account number and IFSC code",
                &["payee_name", "account_number", "ifsc_code"],
                0.9,
            )
            .with_tools(&["add_payee", "validate_ifsc", "list_payees"]),
            stores,
        }
    }
}

impl BankingAgent for AddPayeeAgent {
    fn capability(&self) -> &AgentCapability {
        &self.capability
    }

    fn primary_intent(&self) -> &'static str {
        names::ADD_PAYEE
    }

    fn intents(&self) -> &[&'static str] {
        &[names::ADD_PAYEE, "add_beneficiary", "new_payee"]
    }

    fn keywords(&self) -> &[&'static str] {
        &["add payee", "new payee", "add beneficiary", "new beneficiary"]
    }

    fn accepts(&self, param: &str, value: &str) -> bool {
        match param {
            "payee_name" => value.chars().count() <= MAX_NAME_LEN,
            "account_number" => is_valid_account_number(value),
            "ifsc_code" => is_valid_ifsc(&value.to_uppercase()),
            _ => true,
        }
    }

    fn execute(&self, ctx: &AgentContext) -> AgentResponse {
        let name = self.name();
        let (Some(payee_name), Some(account_number), Some(ifsc)) = (
            ctx.param("payee_name"),
            ctx.param("account_number"),
            ctx.param("ifsc_code").map(str::to_uppercase),
        ) else {
            return AgentResponse::reply(name, "I need the payee's name, account number and IFSC code.");
        };

        let payee = Payee {
            id: Uuid::now_v7().to_string(),
            user_id: ctx.user_id.clone(),
            name: payee_name.to_string(),
            account_number: account_number.to_string(),
            bank_name: bank_name(&ifsc),
            ifsc_code: ifsc,
            created_at: Utc::now(),
        };

        match self.stores.payees.add(payee) {
            Ok(payee) => {
                tracing::info!(session_id = %ctx.session_id, payee_id = %payee.id, "payee added");
                AgentResponse::reply(
                    name,
                    format!(
                        "Payee added successfully!\nName: {}\nAccount: {}\nIFSC: {}\nBank: {}\nYou can now transfer money to {}.",
                        payee.name,
                        mask_account_number(&payee.account_number),
                        payee.ifsc_code,
                        payee.bank_name,
                        payee.name
                    ),
                )
                .with_data(json!({ "payee": payee }))
                .with_actions(&["transfer_money", "list_payees"])
            }
            Err(StoreError::Duplicate(_)) => AgentResponse::reply(
                name,
                format!(
                    "A payee with account number {} already exists.",
                    mask_account_number(account_number)
                ),
            ),
            Err(e) => AgentResponse::reply(name, format!("I couldn't add the payee right now ({e}).")),
        }
    }
}

#[cfg(test)]
mod tests {
    use bankchat_types::error::ChatError;

    use super::super::test_support::{ctx, seeded};
    use super::*;

    fn details() -> [(&'static str, &'static str); 3] {
        [
            ("payee_name", "John Smith"),
            ("account_number", "123456789012"),
            ("ifsc_code", "hdfc0001234"),
        ]
    }

    #[test]
    fn adds_payee_with_bank_from_ifsc() {
        let (memory, stores) = seeded();
        let agent = AddPayeeAgent::new(stores);

        let response = agent.execute(&ctx(names::ADD_PAYEE, "", &details()));

        assert!(response.message.starts_with("Payee added successfully!"));
        let payees = memory.payees.lock().unwrap();
        assert_eq!(payees.len(), 1);
        assert_eq!(payees[0].ifsc_code, "HDFC0001234");
        assert_eq!(payees[0].bank_name, "HDFC Bank");
    }

    #[test]
    fn duplicate_account_is_reported() {
        let (memory, stores) = seeded();
        let agent = AddPayeeAgent::new(stores);
        agent.execute(&ctx(names::ADD_PAYEE, "", &details()));
        let response = agent.execute(&ctx(names::ADD_PAYEE, "", &details()));

        assert!(response.message.contains("already exists"));
        assert_eq!(memory.payees.lock().unwrap().len(), 1);
    }

    #[test]
    fn invalid_ifsc_fails_validation() {
        let agent = AddPayeeAgent::new(seeded().1);
        let params = [
            ("payee_name", "Ravi"),
            ("account_number", "12345"),
            ("ifsc_code", "XX12"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(
            agent.validate(&params).unwrap_err(),
            ChatError::ValidationFailed {
                missing: vec!["account_number".to_string(), "ifsc_code".to_string()]
            }
        );
    }

    #[test]
    fn payee_keyword_does_not_match_pay() {
        let agent = AddPayeeAgent::new(seeded().1);
        assert!(!agent.can_handle(names::FUND_TRANSFER, "pay 500 to my payee"));
        assert!(agent.can_handle(names::GENERAL, "please add payee"));
    }
}
