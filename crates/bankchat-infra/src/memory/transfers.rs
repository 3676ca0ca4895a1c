use bankchat_core::banking::TransferStore;
use bankchat_types::banking::Transfer;
use bankchat_types::error::StoreError;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct MemoryTransferStore {
    transfers: DashMap<String, Vec<Transfer>>,
}

impl MemoryTransferStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransferStore for MemoryTransferStore {
    fn record(&self, transfer: Transfer) -> Result<Transfer, StoreError> {
        if transfer.amount <= 0.0 {
            return Err(StoreError::Invalid(format!("transfer amount {}", transfer.amount)));
        }
        self.transfers
            .entry(transfer.user_id.clone())
            .or_default()
            .push(transfer.clone());
        Ok(transfer)
    }

    fn list(&self, user_id: &str, limit: usize) -> Result<Vec<Transfer>, StoreError> {
        Ok(self
            .transfers
            .get(user_id)
            .map(|t| t.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
