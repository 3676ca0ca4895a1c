//! SSE streaming chat endpoints.
//!
//! - POST /api/v1/chat                 - Start a turn, body `{message, token?}`
//! - GET  /api/v1/chat?message=&token= - Start a turn from query parameters
//! - GET  /api/v1/chat/stream/{id}     - Attach to an existing stream
//!
//! SSE frames:
//! - `session` event: `{ "session_id": "<stream id>", "status": "processing" }`
//! - data frames: `{ "response": "...", "done": false }`
//! - terminal frame: `{ "response": "", "done": true }`, or an `error` event
//!   `{ "error": "..." }` when the stream failed
//!
//! A subscriber may miss chunks when its buffer is full. Every chunk carries
//! its offset into the accumulated text, so the consumer below re-reads any
//! gap from the stream before forwarding the next chunk.

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use serde::{Deserialize, Serialize};

use bankchat_core::chat::TurnHandle;
use bankchat_core::stream::{BroadcastStream, Subscription};
use bankchat_types::session::Session;
use bankchat_types::stream::{ChatFrame, ErrorFrame, StreamOpened};

use crate::http::error::AppError;
use crate::http::extractors::auth::{Authenticated, BearerToken, authenticate};
use crate::state::AppState;

const KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Request body for the POST chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Accepted when no header carries the token.
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    #[serde(default)]
    pub message: String,
}

/// POST /api/v1/chat
pub async fn post_chat(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + use<>>, AppError> {
    let Json(body) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let token = token.or(body.token).ok_or_else(AppError::unauthorized)?;
    let session = authenticate(&state, &token)?;
    start_turn(&state, &session, &body.message)
}

/// GET /api/v1/chat
pub async fn get_chat(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Query(query): Query<ChatQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + use<>>, AppError> {
    start_turn(&state, &session, &query.message)
}

/// GET /api/v1/chat/stream/{id} - Replays what the stream has so far, then
/// follows it to the end.
pub async fn attach_stream(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(stream_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + use<>>, AppError> {
    let stream = state.chat.streams().get_owned(&stream_id, &session.token)?;
    let subscription = stream.subscribe();
    tracing::debug!(session_id = %session.id, stream_id = %stream_id, "attached to stream");
    Ok(sse(stream, subscription))
}

fn start_turn(
    state: &AppState,
    session: &Session,
    message: &str,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + use<>>, AppError> {
    let TurnHandle { stream, subscription } = state.chat.begin_turn(session, message)?;
    tracing::info!(session_id = %session.id, stream_id = %stream.id(), "chat turn started");
    Ok(sse(stream, subscription))
}

fn sse(
    stream: BroadcastStream,
    subscription: Subscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    Sse::new(frames(stream, subscription)).keep_alive(KeepAlive::new().interval(KEEP_ALIVE))
}

fn json_event<T: Serialize>(event: Event, body: &T) -> Event {
    event.data(serde_json::to_string(body).unwrap_or_default())
}

fn chunk_event(text: String) -> Result<Event, Infallible> {
    Ok(json_event(Event::default(), &ChatFrame::chunk(text)))
}

/// The SSE frame sequence for one stream.
///
/// `cursor` is the byte offset up to which text has been forwarded. Text
/// already in the stream is forwarded first; after that each received chunk
/// is forwarded from the cursor, with any gap before it read back from the
/// accumulated text. Dropping the returned stream drops the subscription,
/// which detaches it from the broadcast.
fn frames(
    stream: BroadcastStream,
    mut subscription: Subscription,
) -> impl Stream<Item = Result<Event, Infallible>> + use<> {
    async_stream::stream! {
        let opened = StreamOpened {
            session_id: stream.id().to_string(),
            status: "processing".to_string(),
        };
        yield Ok(json_event(Event::default().event("session"), &opened));

        let backlog = stream.text_since(0);
        let mut cursor = backlog.len();
        if !backlog.is_empty() {
            yield chunk_event(backlog);
        }

        while let Some(chunk) = subscription.recv().await {
            if chunk.end() <= cursor {
                continue;
            }
            if chunk.offset > cursor {
                let gap = stream.text_range(cursor, chunk.offset);
                tracing::debug!(stream_id = %stream.id(), bytes = gap.len(), "repairing missed chunks");
                if !gap.is_empty() {
                    yield chunk_event(gap);
                }
            }
            let fresh = chunk
                .text
                .get(cursor.saturating_sub(chunk.offset)..)
                .unwrap_or_default()
                .to_string();
            cursor = chunk.end();
            if !fresh.is_empty() {
                yield chunk_event(fresh);
            }
        }

        let tail = stream.text_since(cursor);
        if !tail.is_empty() {
            yield chunk_event(tail);
        }

        let terminal = match stream.error() {
            Some(error) => json_event(Event::default().event("error"), &ErrorFrame { error }),
            None => json_event(Event::default(), &ChatFrame::finished()),
        };
        yield Ok(terminal);
    }
}
