use bankchat_core::banking::LoanStore;
use bankchat_types::banking::LoanApplication;
use bankchat_types::error::StoreError;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct MemoryLoanStore {
    applications: DashMap<String, Vec<LoanApplication>>,
}

impl MemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoanStore for MemoryLoanStore {
    fn create_application(&self, application: LoanApplication) -> Result<LoanApplication, StoreError> {
        self.applications
            .entry(application.user_id.clone())
            .or_default()
            .push(application.clone());
        Ok(application)
    }

    fn applications(&self, user_id: &str) -> Result<Vec<LoanApplication>, StoreError> {
        Ok(self.applications.get(user_id).map(|a| a.clone()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use bankchat_types::banking::{LoanStatus, LoanType};
    use chrono::Utc;

    use super::*;

    #[test]
    fn applications_are_per_user() {
        let store = MemoryLoanStore::new();
        store
            .create_application(LoanApplication {
                id: "loan-1".to_string(),
                user_id: "user123".to_string(),
                loan_type: LoanType::Home,
                amount: 2_500_000.0,
                tenure_months: 240,
                interest_rate: 8.5,
                emi: 21_695.55,
                status: LoanStatus::Pending,
                created_at: Utc::now(),
            })
            .unwrap();

        assert_eq!(store.applications("user123").unwrap().len(), 1);
        assert!(store.applications("user456").unwrap().is_empty());
    }
}
