//! Infrastructure layer for BankChat.
//!
//! Contains implementations of the ports defined in `bankchat-core`:
//! in-memory banking stores seeded with demo data, the Ollama streaming
//! text generator, and the TOML configuration loader.

pub mod config;
pub mod llm;
pub mod memory;
