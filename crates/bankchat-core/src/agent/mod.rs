//! Banking agents and the dispatcher that picks one per turn.
//!
//! - `BankingAgent`: one capability, a parameter check, and an action
//! - `AgentDispatcher`: priority-ordered selection with a general fallback
//! - one module per agent: payee, loan, transfer, balance, general

pub mod balance;
pub mod dispatcher;
pub mod general;
pub mod loan;
pub mod payee;
pub mod transfer;

use std::collections::BTreeMap;

use bankchat_types::agent::{AgentCapability, AgentResponse};
use bankchat_types::error::ChatError;

pub use dispatcher::AgentDispatcher;

/// Everything an agent sees for one turn.
#[derive(Debug, Clone, Default)]
pub struct AgentContext {
    pub session_id: String,
    pub user_id: String,
    pub utterance: String,
    pub intent: String,
    pub confidence: f64,
    /// Resolved parameters: extracted entities merged with dialog state.
    pub parameters: BTreeMap<String, String>,
}

impl AgentContext {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// A handler for one family of banking requests.
pub trait BankingAgent: Send + Sync {
    fn capability(&self) -> &AgentCapability;

    /// The intent this agent's dialogs are filed under.
    fn primary_intent(&self) -> &'static str;

    /// Intent names handled outright.
    fn intents(&self) -> &[&'static str];

    /// Lower-case phrases that select this agent from the raw utterance.
    fn keywords(&self) -> &[&'static str];

    fn name(&self) -> &str {
        &self.capability().name
    }

    fn can_handle(&self, intent: &str, utterance: &str) -> bool {
        if self.intents().contains(&intent) {
            return true;
        }
        let lower = utterance.to_lowercase();
        self.keywords().iter().any(|k| lower.contains(k))
    }

    /// Parameters needed before acting, in asking order. May depend on
    /// what is already known (e.g. the loan action).
    fn required_params(&self, _params: &BTreeMap<String, String>) -> Vec<String> {
        self.capability().required_params.clone()
    }

    /// Whether a present value for `param` is usable.
    fn accepts(&self, _param: &str, _value: &str) -> bool {
        true
    }

    /// Names of required parameters that are absent or unusable, in order.
    fn validate(&self, params: &BTreeMap<String, String>) -> Result<(), ChatError> {
        let missing: Vec<String> = self
            .required_params(params)
            .into_iter()
            .filter(|p| match params.get(p).map(|v| v.trim()) {
                Some(v) if !v.is_empty() => !self.accepts(p, v),
                _ => true,
            })
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ChatError::ValidationFailed { missing })
        }
    }

    /// Perform the action. Only called after `validate` passed.
    fn execute(&self, ctx: &AgentContext) -> AgentResponse;
}

/// Rupee amount with two decimals.
pub(crate) fn rupees(amount: f64) -> String {
    format!("₹{amount:.2}")
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Mutex-backed stores for agent tests.

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use bankchat_types::banking::{Account, LoanApplication, Payee, Transfer};
    use bankchat_types::error::StoreError;

    use crate::banking::{AccountStore, BankingStores, LoanStore, PayeeStore, TransferStore};

    #[derive(Default)]
    pub struct Memory {
        pub accounts: Mutex<Vec<Account>>,
        pub payees: Mutex<Vec<Payee>>,
        pub transfers: Mutex<Vec<Transfer>>,
        pub loans: Mutex<Vec<LoanApplication>>,
        pub broken: bool,
        /// Makes `TransferStore::record` fail while everything else works.
        pub refuse_records: AtomicBool,
    }

    impl Memory {
        fn check(&self) -> Result<(), StoreError> {
            if self.broken {
                Err(StoreError::Invalid("store offline".into()))
            } else {
                Ok(())
            }
        }
    }

    impl AccountStore for Memory {
        fn accounts_for(&self, user_id: &str) -> Result<Vec<Account>, StoreError> {
            self.check()?;
            Ok(self
                .accounts
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.user_id == user_id && a.is_active)
                .cloned()
                .collect())
        }

        fn get_account(&self, user_id: &str, account_id: &str) -> Result<Account, StoreError> {
            self.check()?;
            self.accounts
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == account_id && a.user_id == user_id && a.is_active)
                .cloned()
                .ok_or_else(|| StoreError::NotFound("account".into()))
        }

        fn update_balance(&self, account_id: &str, delta: f64) -> Result<Account, StoreError> {
            self.check()?;
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts
                .iter_mut()
                .find(|a| a.id == account_id)
                .ok_or_else(|| StoreError::NotFound("account".into()))?;
            if account.balance + delta < 0.0 {
                return Err(StoreError::InsufficientFunds {
                    available: account.balance,
                    required: -delta,
                });
            }
            account.balance += delta;
            Ok(account.clone())
        }
    }

    impl PayeeStore for Memory {
        fn list(&self, user_id: &str) -> Result<Vec<Payee>, StoreError> {
            self.check()?;
            Ok(self
                .payees
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.user_id == user_id)
                .cloned()
                .collect())
        }

        fn add(&self, payee: Payee) -> Result<Payee, StoreError> {
            self.check()?;
            let mut payees = self.payees.lock().unwrap();
            if payees
                .iter()
                .any(|p| p.user_id == payee.user_id && p.account_number == payee.account_number)
            {
                return Err(StoreError::Duplicate(payee.account_number));
            }
            payees.push(payee.clone());
            Ok(payee)
        }

        fn find(&self, user_id: &str, key: &str) -> Result<Option<Payee>, StoreError> {
            Ok(PayeeStore::list(self, user_id)?.into_iter().find(|p| {
                p.name.eq_ignore_ascii_case(key) || p.account_number == key
            }))
        }
    }

    impl TransferStore for Memory {
        fn record(&self, transfer: Transfer) -> Result<Transfer, StoreError> {
            self.check()?;
            if self.refuse_records.load(Ordering::Relaxed) {
                return Err(StoreError::Invalid("ledger unavailable".into()));
            }
            self.transfers.lock().unwrap().push(transfer.clone());
            Ok(transfer)
        }

        fn list(&self, user_id: &str, limit: usize) -> Result<Vec<Transfer>, StoreError> {
            self.check()?;
            Ok(self
                .transfers
                .lock()
                .unwrap()
                .iter()
                .rev()
                .filter(|t| t.user_id == user_id)
                .take(limit)
                .cloned()
                .collect())
        }
    }

    impl LoanStore for Memory {
        fn create_application(&self, application: LoanApplication) -> Result<LoanApplication, StoreError> {
            self.check()?;
            self.loans.lock().unwrap().push(application.clone());
            Ok(application)
        }

        fn applications(&self, user_id: &str) -> Result<Vec<LoanApplication>, StoreError> {
            self.check()?;
            Ok(self
                .loans
                .lock()
                .unwrap()
                .iter()
                .filter(|l| l.user_id == user_id)
                .cloned()
                .collect())
        }
    }

    pub fn account(id: &str, number: &str, kind: &str, balance: f64) -> Account {
        Account {
            id: id.into(),
            user_id: "user123".into(),
            account_number: number.into(),
            account_type: kind.into(),
            balance,
            currency: "INR".into(),
            is_active: true,
        }
    }

    /// Seeded memory plus the store bundle pointing at it.
    pub fn seeded() -> (Arc<Memory>, BankingStores) {
        let memory = Arc::new(Memory::default());
        memory.accounts.lock().unwrap().extend([
            account("ACC_001", "1234567890", "Savings", 150_000.0),
            account("ACC_002", "0987654321", "Current", 250_000.0),
        ]);
        let stores = stores_for(memory.clone());
        (memory, stores)
    }

    pub fn broken() -> BankingStores {
        stores_for(Arc::new(Memory {
            broken: true,
            ..Memory::default()
        }))
    }

    fn stores_for(memory: Arc<Memory>) -> BankingStores {
        BankingStores {
            accounts: memory.clone(),
            payees: memory.clone(),
            transfers: memory.clone(),
            loans: memory,
        }
    }

    pub fn ctx(intent: &str, utterance: &str, params: &[(&str, &str)]) -> super::AgentContext {
        super::AgentContext {
            session_id: "sess".into(),
            user_id: "user123".into(),
            utterance: utterance.into(),
            intent: intent.into(),
            confidence: 0.9,
            parameters: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}
