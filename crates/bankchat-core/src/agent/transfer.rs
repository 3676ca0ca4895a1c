//! Moving money out of the customer's account.

use bankchat_types::agent::{AgentCapability, AgentResponse};
use bankchat_types::banking::{Account, Transfer, TransferMethod, TransferStatus, mask_account_number};
use bankchat_types::intent::names;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::banking::validate::parse_amount;
use crate::banking::{BankingStores, fees};

use super::{AgentContext, BankingAgent, rupees};

pub struct FundTransferAgent {
    capability: AgentCapability,
    stores: BankingStores,
}

impl FundTransferAgent {
    pub fn new(stores: BankingStores) -> Self {
        Self {
            capability: AgentCapability::new(
                "FundTransferAgent",
                "Transfers money to payees or accounts via UPI, IMPS, NEFT or RTGS",
                &["amount", "method"],
                0.9,
            )
            .with_tools(&["transfer_money", "calculate_fees", "check_limits"]),
            stores,
        }
    }

    /// Source account: the one named by id, number or type if given, else
    /// the first savings account, else the first account.
    fn source_account(&self, user_id: &str, hint: Option<&str>) -> Result<Account, String> {
        if let Some(id) = hint
            && let Ok(account) = self.stores.accounts.get_account(user_id, id)
        {
            return Ok(account);
        }

        let accounts = self
            .stores
            .accounts
            .accounts_for(user_id)
            .map_err(|e| format!("I couldn't load your accounts right now ({e}). Please try again."))?;

        if let Some(hint) = hint
            && let Some(account) = accounts
                .iter()
                .find(|a| a.account_number == hint || a.account_type.eq_ignore_ascii_case(hint))
        {
            return Ok(account.clone());
        }
        accounts
            .iter()
            .find(|a| a.account_type.eq_ignore_ascii_case("savings"))
            .or_else(|| accounts.first())
            .cloned()
            .ok_or_else(|| "You don't have an active account to transfer from.".to_string())
    }

    /// Display name for the destination, resolved through saved payees.
    fn destination(&self, ctx: &AgentContext) -> String {
        let Some(key) = ctx.param("recipient").or_else(|| ctx.param("account_number")) else {
            return "the beneficiary".to_string();
        };
        match self.stores.payees.find(&ctx.user_id, key) {
            Ok(Some(payee)) => format!("{} ({})", payee.name, mask_account_number(&payee.account_number)),
            _ => key.to_string(),
        }
    }
}

impl BankingAgent for FundTransferAgent {
    fn capability(&self) -> &AgentCapability {
        &self.capability
    }

    fn primary_intent(&self) -> &'static str {
        names::FUND_TRANSFER
    }

    fn intents(&self) -> &[&'static str] {
        &[names::FUND_TRANSFER, "send_money", "transfer_money", "pay_money", "upi_transfer"]
    }

    fn keywords(&self) -> &[&'static str] {
        &["transfer", "send money", "pay money"]
    }

    fn accepts(&self, param: &str, value: &str) -> bool {
        match param {
            "amount" => parse_amount(value).is_some_and(|a| a > 0.0),
            "method" => value.parse::<TransferMethod>().is_ok(),
            _ => true,
        }
    }

    fn execute(&self, ctx: &AgentContext) -> AgentResponse {
        let name = self.name();
        let (Some(amount), Some(method)) = (
            ctx.param("amount").and_then(parse_amount),
            ctx.param("method").and_then(|m| m.parse::<TransferMethod>().ok()),
        ) else {
            return AgentResponse::reply(name, "I need a valid amount and transfer method to continue.");
        };

        if let Err(reason) = fees::check_limits(method, amount) {
            return AgentResponse::reply(name, reason);
        }

        let from = match self.source_account(&ctx.user_id, ctx.param("from_account")) {
            Ok(account) => account,
            Err(message) => return AgentResponse::reply(name, message),
        };

        let fee = fees::transfer_fee(method, amount);
        let total = amount + fee;
        if from.balance < total {
            return AgentResponse::reply(
                name,
                format!(
                    "Insufficient balance. Available: {}, required: {} (including {} fee).",
                    rupees(from.balance),
                    rupees(total),
                    rupees(fee)
                ),
            );
        }

        let updated = match self.stores.accounts.update_balance(&from.id, -total) {
            Ok(account) => account,
            Err(e) => return AgentResponse::reply(name, format!("The transfer could not be completed: {e}.")),
        };

        let to = self.destination(ctx);
        let now = Utc::now();
        let transfer = Transfer {
            id: Uuid::now_v7().to_string(),
            user_id: ctx.user_id.clone(),
            from_account: from.id.clone(),
            to: to.clone(),
            amount,
            fees: fee,
            method,
            status: TransferStatus::Completed,
            reference: format!("TXN{}", now.timestamp_millis()),
            created_at: now,
        };
        let transfer = match self.stores.transfers.record(transfer) {
            Ok(t) => t,
            Err(e) => {
                // An unrecorded transfer must not leave the account debited.
                if let Err(refund) = self.stores.accounts.update_balance(&from.id, total) {
                    tracing::error!(error = %refund, account = %from.id, amount = total, "debit reversal failed");
                    return AgentResponse::reply(
                        name,
                        format!("Your account was debited but the receipt could not be saved ({e}). Please contact support."),
                    );
                }
                tracing::warn!(error = %e, account = %from.id, "transfer not recorded, debit reversed");
                return AgentResponse::reply(
                    name,
                    format!("The transfer could not be completed: {e}. Your account has not been charged."),
                );
            }
        };

        tracing::info!(session_id = %ctx.session_id, reference = %transfer.reference, %method, "transfer completed");

        AgentResponse::reply(
            name,
            format!(
                "Transfer successful! {} sent to {} via {}.\nFee: {}\nReference: {}\nSettlement: {}\nRemaining balance in {}: {}",
                rupees(amount),
                to,
                method,
                rupees(fee),
                transfer.reference,
                method.settlement(),
                updated.masked_number(),
                rupees(updated.balance),
            ),
        )
        .with_data(json!({
            "transfer": transfer,
            "new_balance": updated.balance,
        }))
        .with_actions(&["view_transfers", "check_balance"])
    }
}
