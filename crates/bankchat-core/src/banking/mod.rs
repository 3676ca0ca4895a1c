//! Banking domain rules and the storage ports agents act through.
//!
//! Store traits are implemented in `bankchat-infra`; this crate never
//! depends on a concrete backend.

pub mod emi;
pub mod fees;
pub mod products;
pub mod store;
pub mod validate;

pub use store::{AccountStore, BankingStores, LoanStore, PayeeStore, TransferStore};
