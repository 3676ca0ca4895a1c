//! Conversation log for the calling session.
//!
//! - GET    /api/v1/conversation/history
//! - DELETE /api/v1/conversation/history

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde_json::json;

use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

pub async fn get_history(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Json<ApiResponse<serde_json::Value>> {
    let start = Instant::now();
    let turns = state.chat.history().history(&session.id);
    Json(ApiResponse::timed(
        json!({ "session_id": session.id, "turns": turns }),
        start,
    ))
}

/// Clears the log. An active dialog is left as it is.
pub async fn clear_history(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Json<ApiResponse<serde_json::Value>> {
    let start = Instant::now();
    let cleared = state.chat.history().clear(&session.id);
    tracing::debug!(session_id = %session.id, cleared, "conversation history cleared");
    Json(ApiResponse::timed(json!({ "cleared": cleared }), start))
}
