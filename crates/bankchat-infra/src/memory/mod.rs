//! In-memory banking stores.
//!
//! DashMap-backed implementations of the storage ports in
//! `bankchat-core::banking`. [`seeded_stores`] builds the full set with the
//! demo customer used by the server.

pub mod accounts;
pub mod loans;
pub mod payees;
pub mod transfers;

use std::sync::Arc;

use bankchat_core::banking::BankingStores;
use bankchat_types::banking::Account;

pub use accounts::MemoryAccountStore;
pub use loans::MemoryLoanStore;
pub use payees::MemoryPayeeStore;
pub use transfers::MemoryTransferStore;

/// Customer every demo session is bound to when none is given.
pub const DEMO_USER: &str = "user123";

/// The demo customer's accounts.
pub fn demo_accounts() -> Vec<Account> {
    vec![
        Account {
            id: "ACC_001".to_string(),
            user_id: DEMO_USER.to_string(),
            account_number: "1234567890".to_string(),
            account_type: "Savings".to_string(),
            balance: 150_000.0,
            currency: "INR".to_string(),
            is_active: true,
        },
        Account {
            id: "ACC_002".to_string(),
            user_id: DEMO_USER.to_string(),
            account_number: "0987654321".to_string(),
            account_type: "Current".to_string(),
            balance: 250_000.0,
            currency: "INR".to_string(),
            is_active: true,
        },
    ]
}

/// Fresh stores holding only the demo accounts.
pub fn seeded_stores() -> BankingStores {
    BankingStores {
        accounts: Arc::new(MemoryAccountStore::with_accounts(demo_accounts())),
        payees: Arc::new(MemoryPayeeStore::new()),
        transfers: Arc::new(MemoryTransferStore::new()),
        loans: Arc::new(MemoryLoanStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_stores_hold_demo_accounts() {
        let stores = seeded_stores();
        let accounts = stores.accounts.accounts_for(DEMO_USER).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].id, "ACC_001");
        assert_eq!(accounts[0].masked_number(), "XXXXXX7890");
        assert_eq!(accounts[1].balance, 250_000.0);
        assert!(stores.payees.list(DEMO_USER).unwrap().is_empty());
    }
}
