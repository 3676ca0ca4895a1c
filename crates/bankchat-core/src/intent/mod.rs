//! Keyword and pattern intent classification with entity extraction.

pub mod catalog;
pub mod entities;
pub mod router;

pub use entities::EntityExtractor;
pub use router::{IntentPattern, IntentRouter};
