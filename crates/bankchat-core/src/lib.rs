//! Session, streaming, dialog and agent orchestration for BankChat.
//!
//! This crate owns the conversational core and the ports (store traits,
//! `TextGenerator`) that `bankchat-infra` implements. It never depends on
//! a concrete backend or on HTTP.

pub mod agent;
pub mod banking;
pub mod chat;
pub mod dialog;
pub mod intent;
pub mod reaper;
pub mod session;
pub mod stream;
