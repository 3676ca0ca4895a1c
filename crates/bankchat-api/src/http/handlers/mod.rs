//! HTTP request handlers for the REST API.

pub mod agents;
pub mod auth;
pub mod banking;
pub mod chat;
pub mod conversation;
pub mod poll;
