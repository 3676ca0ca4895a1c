//! Agent capability listing.
//!
//! - GET /api/v1/agents         - Every agent, fallback last
//! - GET /api/v1/agents/{name}  - One agent by name (case-insensitive)

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};

use bankchat_types::agent::AgentCapability;
use bankchat_types::error::ChatError;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

pub async fn list_agents(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Json<ApiResponse<Vec<AgentCapability>>> {
    let start = Instant::now();
    Json(ApiResponse::timed(state.chat.dispatcher().capabilities(), start))
}

pub async fn get_agent(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<AgentCapability>>, AppError> {
    let start = Instant::now();
    let capability = state
        .chat
        .dispatcher()
        .capabilities()
        .into_iter()
        .find(|c| c.name.eq_ignore_ascii_case(&name))
        .ok_or_else(|| ChatError::NotFound(format!("agent '{name}'")))?;
    Ok(Json(ApiResponse::timed(capability, start)))
}
