use bankchat_core::banking::AccountStore;
use bankchat_types::banking::Account;
use bankchat_types::error::StoreError;
use dashmap::DashMap;

/// Accounts keyed by account id.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: DashMap<String, Account>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let store = Self::new();
        for account in accounts {
            store.insert(account);
        }
        store
    }

    pub fn insert(&self, account: Account) {
        self.accounts.insert(account.id.clone(), account);
    }
}

impl AccountStore for MemoryAccountStore {
    fn accounts_for(&self, user_id: &str) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id && a.is_active)
            .map(|a| a.value().clone())
            .collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(accounts)
    }

    fn get_account(&self, user_id: &str, account_id: &str) -> Result<Account, StoreError> {
        self.accounts
            .get(account_id)
            .filter(|a| a.user_id == user_id && a.is_active)
            .map(|a| a.value().clone())
            .ok_or_else(|| StoreError::NotFound(format!("account {account_id}")))
    }

    fn update_balance(&self, account_id: &str, delta: f64) -> Result<Account, StoreError> {
        let mut account = self
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| StoreError::NotFound(format!("account {account_id}")))?;
        let balance = account.balance + delta;
        if balance < 0.0 {
            return Err(StoreError::InsufficientFunds {
                available: account.balance,
                required: -delta,
            });
        }
        account.balance = (balance * 100.0).round() / 100.0;
        tracing::debug!(account_id, delta, balance = account.balance, "balance updated");
        Ok(account.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::demo_accounts;

    fn store() -> MemoryAccountStore {
        MemoryAccountStore::with_accounts(demo_accounts())
    }

    #[test]
    fn debit_and_credit() {
        let store = store();
        assert_eq!(store.update_balance("ACC_001", -500.0).unwrap().balance, 149_500.0);
        assert_eq!(store.update_balance("ACC_001", 0.25).unwrap().balance, 149_500.25);
        assert_eq!(store.get_account("user123", "ACC_001").unwrap().balance, 149_500.25);
    }

    #[test]
    fn overdraft_is_refused_and_balance_kept() {
        let store = store();
        let err = store.update_balance("ACC_001", -150_000.01).unwrap_err();
        assert!(matches!(err, StoreError::InsufficientFunds { .. }));
        assert_eq!(store.get_account("user123", "ACC_001").unwrap().balance, 150_000.0);
    }

    #[test]
    fn unknown_account_is_not_found() {
        assert_eq!(
            store().get_account("user123", "ACC_999").unwrap_err(),
            StoreError::NotFound("account ACC_999".to_string())
        );
    }

    #[test]
    fn accounts_of_other_users_are_not_found() {
        let store = store();
        assert_eq!(
            store.get_account("someone-else", "ACC_001").unwrap_err(),
            StoreError::NotFound("account ACC_001".to_string())
        );
    }

    #[test]
    fn inactive_accounts_are_hidden() {
        let store = store();
        let mut closed = store.get_account("user123", "ACC_002").unwrap();
        closed.is_active = false;
        store.insert(closed);
        assert!(store.get_account("user123", "ACC_002").is_err());
        let ids: Vec<String> = store.accounts_for("user123").unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["ACC_001"]);
        assert!(store.accounts_for("nobody").unwrap().is_empty());
    }
}
