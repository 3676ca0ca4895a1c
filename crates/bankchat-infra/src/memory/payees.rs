use bankchat_core::banking::PayeeStore;
use bankchat_types::banking::Payee;
use bankchat_types::error::StoreError;
use dashmap::DashMap;

/// Payees grouped by owning user, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryPayeeStore {
    payees: DashMap<String, Vec<Payee>>,
}

impl MemoryPayeeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PayeeStore for MemoryPayeeStore {
    fn list(&self, user_id: &str) -> Result<Vec<Payee>, StoreError> {
        Ok(self.payees.get(user_id).map(|p| p.clone()).unwrap_or_default())
    }

    fn add(&self, payee: Payee) -> Result<Payee, StoreError> {
        let mut payees = self.payees.entry(payee.user_id.clone()).or_default();
        if payees.iter().any(|p| p.account_number == payee.account_number) {
            return Err(StoreError::Duplicate(format!(
                "payee with account number {}",
                payee.account_number
            )));
        }
        payees.push(payee.clone());
        Ok(payee)
    }

    fn find(&self, user_id: &str, name_or_account: &str) -> Result<Option<Payee>, StoreError> {
        let needle = name_or_account.trim();
        Ok(self.payees.get(user_id).and_then(|payees| {
            payees
                .iter()
                .find(|p| p.account_number == needle || p.name.eq_ignore_ascii_case(needle))
                .cloned()
        }))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn payee(name: &str, account: &str) -> Payee {
        Payee {
            id: format!("p-{account}"),
            user_id: "user123".to_string(),
            name: name.to_string(),
            account_number: account.to_string(),
            ifsc_code: "SBIN0001234".to_string(),
            bank_name: "State Bank of India".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_account_number_is_rejected() {
        let store = MemoryPayeeStore::new();
        store.add(payee("Asha", "111122223333")).unwrap();
        let err = store.add(payee("Someone Else", "111122223333")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.list("user123").unwrap().len(), 1);
    }

    #[test]
    fn same_account_for_different_users_is_allowed() {
        let store = MemoryPayeeStore::new();
        store.add(payee("Asha", "111122223333")).unwrap();
        let mut other = payee("Asha", "111122223333");
        other.user_id = "user456".to_string();
        assert!(store.add(other).is_ok());
    }

    #[test]
    fn find_by_name_ignores_case() {
        let store = MemoryPayeeStore::new();
        store.add(payee("Asha Rao", "111122223333")).unwrap();
        assert_eq!(store.find("user123", "asha rao").unwrap().unwrap().account_number, "111122223333");
        assert_eq!(store.find("user123", "111122223333").unwrap().unwrap().name, "Asha Rao");
        assert!(store.find("user123", "Ravi").unwrap().is_none());
        assert!(store.find("user456", "Asha Rao").unwrap().is_none());
    }
}
