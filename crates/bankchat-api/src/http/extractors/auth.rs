//! Session token authentication extractors.
//!
//! Tokens are read from, in order:
//! - `Authorization: Bearer <token>` header
//! - `X-Session-Token: <token>` header
//! - `token` query parameter
//!
//! Every failure, whether the token is missing, unknown or expired, is the
//! same 401.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;

use bankchat_core::session::token::fingerprint;
use bankchat_types::session::Session;

use crate::http::error::AppError;
use crate::state::AppState;

/// The caller's token, if one was presented. Never rejects.
pub struct BearerToken(pub Option<String>);

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BearerToken(extract_token(parts)))
    }
}

/// A validated session. Extracting this authenticates the request.
pub struct Authenticated(pub Session);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or_else(AppError::unauthorized)?;
        authenticate(state, &token).map(Authenticated)
    }
}

/// Validate `token` against the session store.
pub fn authenticate(state: &AppState, token: &str) -> Result<Session, AppError> {
    state.sessions.validate(token).map_err(|e| {
        tracing::debug!(token = %fingerprint(token), error = %e, "authentication failed");
        AppError::unauthorized()
    })
}

fn extract_token(parts: &Parts) -> Option<String> {
    let non_empty = |t: &str| {
        let t = t.trim();
        (!t.is_empty()).then(|| t.to_string())
    };

    if let Some(auth) = parts.headers.get(axum::http::header::AUTHORIZATION)
        && let Ok(auth) = auth.to_str()
        && let Some(token) = auth.strip_prefix("Bearer ").and_then(non_empty)
    {
        return Some(token);
    }

    if let Some(header) = parts.headers.get("x-session-token")
        && let Ok(token) = header.to_str()
        && let Some(token) = non_empty(token)
    {
        return Some(token);
    }

    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .and_then(|t| non_empty(t.as_str()))
}
