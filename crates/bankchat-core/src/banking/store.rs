//! Storage ports for accounts, payees, transfers and loans.
//!
//! Calls are synchronous and short; implementations must not block on I/O
//! while holding a lock another call needs.

use std::sync::Arc;

use bankchat_types::banking::{Account, LoanApplication, Payee, Transfer};
use bankchat_types::error::StoreError;

pub trait AccountStore: Send + Sync {
    /// Active accounts belonging to `user_id`.
    fn accounts_for(&self, user_id: &str) -> Result<Vec<Account>, StoreError>;

    /// One active account, `NotFound` unless it belongs to `user_id`.
    fn get_account(&self, user_id: &str, account_id: &str) -> Result<Account, StoreError>;

    /// Apply `delta` to the balance, refusing to go below zero.
    fn update_balance(&self, account_id: &str, delta: f64) -> Result<Account, StoreError>;
}

pub trait PayeeStore: Send + Sync {
    fn list(&self, user_id: &str) -> Result<Vec<Payee>, StoreError>;

    /// Fails with `Duplicate` if the user already has this account number.
    fn add(&self, payee: Payee) -> Result<Payee, StoreError>;

    /// Case-insensitive lookup by name or exact account number.
    fn find(&self, user_id: &str, name_or_account: &str) -> Result<Option<Payee>, StoreError>;
}

pub trait TransferStore: Send + Sync {
    fn record(&self, transfer: Transfer) -> Result<Transfer, StoreError>;

    /// Transfers for `user_id`, newest first.
    fn list(&self, user_id: &str, limit: usize) -> Result<Vec<Transfer>, StoreError>;
}

pub trait LoanStore: Send + Sync {
    fn create_application(&self, application: LoanApplication) -> Result<LoanApplication, StoreError>;

    fn applications(&self, user_id: &str) -> Result<Vec<LoanApplication>, StoreError>;
}

/// The set of stores agents share.
#[derive(Clone)]
pub struct BankingStores {
    pub accounts: Arc<dyn AccountStore>,
    pub payees: Arc<dyn PayeeStore>,
    pub transfers: Arc<dyn TransferStore>,
    pub loans: Arc<dyn LoanStore>,
}

impl std::fmt::Debug for BankingStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankingStores").finish_non_exhaustive()
    }
}
