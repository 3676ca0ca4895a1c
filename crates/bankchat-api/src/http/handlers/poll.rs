//! GET /api/v1/chat/poll/{id} - Pull the text produced since the last poll.

use axum::Json;
use axum::extract::{Path, State};

use bankchat_types::stream::PollResponse;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

pub async fn poll_stream(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(stream_id): Path<String>,
) -> Result<Json<PollResponse>, AppError> {
    let stream = state.chat.streams().get_owned(&stream_id, &session.token)?;
    let (content, done) = stream.snapshot();
    let error = if done { stream.error() } else { None };
    Ok(Json(PollResponse { content, done, error }))
}
