//! Shared domain types for BankChat.
//!
//! Sessions, stream frames, intents, agent responses, banking records,
//! configuration, and the error taxonomy used across the workspace.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod agent;
pub mod banking;
pub mod chat;
pub mod config;
pub mod error;
pub mod intent;
pub mod session;
pub mod stream;
