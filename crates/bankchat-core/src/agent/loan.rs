//! Loan information, eligibility, EMI calculation and applications.

use std::collections::BTreeMap;

use bankchat_types::agent::{AgentCapability, AgentResponse};
use bankchat_types::banking::{LoanApplication, LoanProduct, LoanStatus, LoanType};
use bankchat_types::intent::names;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::banking::BankingStores;
use crate::banking::emi::calculate_emi;
use crate::banking::products::{DEFAULT_TENURE_MONTHS, all_products, check_bounds, loan_product};
use crate::banking::validate::parse_amount;

use super::{AgentContext, BankingAgent, rupees};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoanAction {
    Info,
    Eligibility,
    Calculate,
    Apply,
}

impl LoanAction {
    fn from_params(params: &BTreeMap<String, String>) -> Self {
        match params.get("action").map(|a| a.trim().to_lowercase()).as_deref() {
            Some("apply") => LoanAction::Apply,
            Some("eligibility") => LoanAction::Eligibility,
            Some("calculate") | Some("emi") => LoanAction::Calculate,
            _ => LoanAction::Info,
        }
    }
}

pub struct LoanAgent {
    capability: AgentCapability,
    stores: BankingStores,
}

impl LoanAgent {
    pub fn new(stores: BankingStores) -> Self {
        Self {
            capability: AgentCapability::new(
                "LoanAgent",
                "Explains loan products, checks eligibility, calculates EMI and files applications",
                &["loan_type", "amount"],
                0.85,
            )
            .with_tools(&["loan_info", "check_eligibility", "calculate_emi", "apply_loan"]),
            stores,
        }
    }

    fn product(ctx: &AgentContext) -> Option<LoanProduct> {
        ctx.param("loan_type")
            .and_then(|t| t.parse::<LoanType>().ok())
            .map(loan_product)
    }

    fn tenure(ctx: &AgentContext) -> u32 {
        ctx.param("tenure")
            .and_then(|t| t.parse::<u32>().ok())
            .unwrap_or(DEFAULT_TENURE_MONTHS)
    }

    fn info(&self, ctx: &AgentContext) -> AgentResponse {
        let products = match Self::product(ctx) {
            Some(product) => vec![product],
            None => all_products(),
        };
        let mut message = String::from("Here are our loan products:\n");
        for p in &products {
            message.push_str(&format!(
                "• {}: {} to {} at {:.2}% p.a., up to {} months, processing fee {}%\n",
                p.name,
                rupees(p.min_amount),
                rupees(p.max_amount),
                p.interest_rate,
                p.max_tenure_months,
                p.processing_fee
            ));
        }
        message.push_str("Ask me to calculate an EMI or apply for any of these.");
        AgentResponse::reply(self.name(), message)
            .with_data(json!({ "products": products }))
            .with_actions(&["calculate_emi", "apply_loan"])
    }

    fn eligibility(&self, ctx: &AgentContext, product: &LoanProduct) -> AgentResponse {
        let message = format!(
            "For a {} you need:\n• An amount between {} and {}\n• A tenure of at most {} months\n• A processing fee of {}% of the amount\nCurrent rate: {:.2}% p.a. Final approval is subject to document verification.",
            product.name,
            rupees(product.min_amount),
            rupees(product.max_amount),
            product.max_tenure_months,
            product.processing_fee,
            product.interest_rate
        );
        tracing::debug!(session_id = %ctx.session_id, loan_type = %product.loan_type, "eligibility requested");
        AgentResponse::reply(self.name(), message)
            .with_data(json!({ "product": product }))
            .with_actions(&["calculate_emi", "apply_loan"])
    }

    fn calculate(&self, ctx: &AgentContext, product: &LoanProduct, amount: f64) -> AgentResponse {
        let tenure = Self::tenure(ctx);
        let rate = ctx
            .param("interest_rate")
            .and_then(|r| r.parse::<f64>().ok())
            .unwrap_or(product.interest_rate);
        let emi = calculate_emi(amount, rate, tenure);
        AgentResponse::reply(
            self.name(),
            format!(
                "EMI for a {} of {} over {} months at {:.2}%:\n• Monthly EMI: {}\n• Total interest: {}\n• Total payable: {}",
                product.name,
                rupees(amount),
                tenure,
                rate,
                rupees(emi.emi),
                rupees(emi.total_interest),
                rupees(emi.total_amount)
            ),
        )
        .with_data(json!({ "emi": emi }))
        .with_actions(&["apply_loan"])
    }

    fn apply(&self, ctx: &AgentContext, product: &LoanProduct, amount: f64) -> AgentResponse {
        let tenure = Self::tenure(ctx);
        if let Err(reason) = check_bounds(product, amount, tenure) {
            return AgentResponse::reply(self.name(), reason);
        }
        let emi = calculate_emi(amount, product.interest_rate, tenure);
        let application = LoanApplication {
            id: Uuid::now_v7().to_string(),
            user_id: ctx.user_id.clone(),
            loan_type: product.loan_type,
            amount,
            tenure_months: tenure,
            interest_rate: product.interest_rate,
            emi: emi.emi,
            status: LoanStatus::Pending,
            created_at: Utc::now(),
        };
        match self.stores.loans.create_application(application) {
            Ok(application) => {
                tracing::info!(session_id = %ctx.session_id, application_id = %application.id, "loan application filed");
                let fee = amount * product.processing_fee / 100.0;
                AgentResponse::reply(
                    self.name(),
                    format!(
                        "Your {} application has been submitted.\nApplication ID: {}\nAmount: {}\nTenure: {} months\nMonthly EMI: {}\nProcessing fee: {}\nStatus: pending review",
                        product.name,
                        application.id,
                        rupees(amount),
                        tenure,
                        rupees(emi.emi),
                        rupees(fee)
                    ),
                )
                .with_data(json!({ "application": application, "emi": emi }))
                .with_actions(&["check_balance"])
            }
            Err(e) => AgentResponse::reply(self.name(), format!("I couldn't submit your application right now ({e}).")),
        }
    }
}

impl BankingAgent for LoanAgent {
    fn capability(&self) -> &AgentCapability {
        &self.capability
    }

    fn primary_intent(&self) -> &'static str {
        names::LOAN_APPLICATION
    }

    fn intents(&self) -> &[&'static str] {
        &[names::LOAN_APPLICATION, "loan_inquiry", "emi_calculation", "loan_eligibility"]
    }

    fn keywords(&self) -> &[&'static str] {
        &["loan", "calculate emi", "emi calculat"]
    }

    fn required_params(&self, params: &BTreeMap<String, String>) -> Vec<String> {
        let required: &[&str] = match LoanAction::from_params(params) {
            LoanAction::Info => &[],
            LoanAction::Eligibility => &["loan_type"],
            LoanAction::Calculate | LoanAction::Apply => &["loan_type", "amount"],
        };
        required.iter().map(|p| p.to_string()).collect()
    }

    fn accepts(&self, param: &str, value: &str) -> bool {
        match param {
            "loan_type" => value.parse::<LoanType>().is_ok(),
            "amount" => parse_amount(value).is_some_and(|a| a > 0.0),
            _ => true,
        }
    }

    fn execute(&self, ctx: &AgentContext) -> AgentResponse {
        let action = LoanAction::from_params(&ctx.parameters);
        if action == LoanAction::Info {
            return self.info(ctx);
        }
        let Some(product) = Self::product(ctx) else {
            return self.info(ctx);
        };
        if action == LoanAction::Eligibility {
            return self.eligibility(ctx, &product);
        }
        let Some(amount) = ctx.param("amount").and_then(parse_amount) else {
            return AgentResponse::reply(self.name(), "Please tell me the loan amount.");
        };
        match action {
            LoanAction::Apply => self.apply(ctx, &product, amount),
            _ => self.calculate(ctx, &product, amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{ctx, seeded};
    use super::*;

    #[test]
    fn info_lists_every_product() {
        let agent = LoanAgent::new(seeded().1);
        let response = agent.execute(&ctx(names::LOAN_APPLICATION, "tell me about loans", &[]));
        for name in ["Personal Loan", "Home Loan", "Car Loan", "Education Loan"] {
            assert!(response.message.contains(name), "missing {name}");
        }
    }

    #[test]
    fn apply_requires_type_then_amount() {
        let agent = LoanAgent::new(seeded().1);
        let params = [("action".to_string(), "apply".to_string())].into_iter().collect();
        assert_eq!(agent.required_params(&params), vec!["loan_type", "amount"]);
        assert!(agent.validate(&params).is_err());
    }

    #[test]
    fn calculate_uses_product_rate_and_default_tenure() {
        let agent = LoanAgent::new(seeded().1);
        let response = agent.execute(&ctx(
            names::LOAN_APPLICATION,
            "",
            &[("action", "calculate"), ("loan_type", "personal"), ("amount", "100000")],
        ));
        assert!(response.message.contains("over 24 months at 12.00%"));
        let emi = calculate_emi(100_000.0, 12.0, 24);
        assert_eq!(response.data.unwrap()["emi"]["emi"], emi.emi);
    }

    #[test]
    fn apply_files_pending_application() {
        let (memory, stores) = seeded();
        let agent = LoanAgent::new(stores);
        let response = agent.execute(&ctx(
            names::LOAN_APPLICATION,
            "",
            &[("action", "apply"), ("loan_type", "car"), ("amount", "500000"), ("tenure", "36")],
        ));
        assert!(response.message.contains("application has been submitted"));
        let loans = memory.loans.lock().unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].status, LoanStatus::Pending);
        assert_eq!(loans[0].tenure_months, 36);
        assert_eq!(loans[0].interest_rate, 9.5);
    }

    #[test]
    fn apply_out_of_bounds_is_rejected() {
        let (memory, stores) = seeded();
        let agent = LoanAgent::new(stores);
        let response = agent.execute(&ctx(
            names::LOAN_APPLICATION,
            "",
            &[("action", "apply"), ("loan_type", "home"), ("amount", "10000")],
        ));
        assert!(response.message.contains("Home Loan amounts range"));
        assert!(memory.loans.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_loan_type_is_invalid() {
        let agent = LoanAgent::new(seeded().1);
        assert!(!agent.accepts("loan_type", "gold"));
        assert!(agent.accepts("loan_type", "Housing"));
    }
}
