//! Bearer-token sessions.
//!
//! - `store`: `TokenSessionStore`, token to caller identity with fixed expiry
//! - `token`: token minting and log-safe fingerprints

pub mod store;
pub mod token;

pub use store::TokenSessionStore;
