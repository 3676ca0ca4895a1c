//! Session login and logout.
//!
//! Endpoints:
//! - POST /api/v1/auth         - Mint a session token
//! - POST /api/v1/auth/logout  - Invalidate the presented token

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use bankchat_core::session::token::fingerprint;
use bankchat_infra::memory::DEMO_USER;
use bankchat_types::session::SessionGrant;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

/// Request body for login. The body itself is optional.
#[derive(Debug, Default, Deserialize)]
pub struct AuthRequest {
    pub user_id: Option<String>,
}

/// POST /api/v1/auth - Mint a session for `user_id` (the demo user when absent).
pub async fn login(State(state): State<AppState>, body: Bytes) -> Result<Json<SessionGrant>, AppError> {
    let request: AuthRequest = if body.iter().all(u8::is_ascii_whitespace) {
        AuthRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?
    };

    let user_id = request
        .user_id
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEMO_USER.to_string());

    let session = state.sessions.create(&user_id)?;
    tracing::info!(
        session_id = %session.id,
        user_id = %user_id,
        token = %fingerprint(&session.token),
        "session created"
    );
    Ok(Json(SessionGrant::from(&session)))
}

/// POST /api/v1/auth/logout - Drop the session and everything held for it.
pub async fn logout(State(state): State<AppState>, Authenticated(session): Authenticated) -> StatusCode {
    state.sessions.delete(&session.id);
    state.chat.end_session(&session);
    tracing::info!(session_id = %session.id, "session logged out");
    StatusCode::NO_CONTENT
}
