//! HTTP/REST API layer for BankChat.
//!
//! Axum-based API at `/api/v1/` with bearer session tokens, SSE chat
//! streaming, envelope responses for REST resources, and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
