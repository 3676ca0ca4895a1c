//! Axum router configuration with middleware.
//!
//! API routes are under `/api/v1/`; `/health` sits at the root.
//! Middleware: panic recovery, CORS, tracing.

use std::any::Any;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use bankchat_types::error::ChatError;

use crate::http::error::AppError;
use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    let api_routes = Router::new()
        // Sessions
        .route("/auth", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        // Chat
        .route(
            "/chat",
            post(handlers::chat::post_chat).get(handlers::chat::get_chat),
        )
        .route("/chat/stream/{id}", get(handlers::chat::attach_stream))
        .route("/chat/poll/{id}", get(handlers::poll::poll_stream))
        // Agents
        .route("/agents", get(handlers::agents::list_agents))
        .route("/agents/{name}", get(handlers::agents::get_agent))
        // Conversation
        .route(
            "/conversation/history",
            get(handlers::conversation::get_history).delete(handlers::conversation::clear_history),
        )
        // Banking resources
        .route("/accounts", get(handlers::banking::list_accounts))
        .route("/accounts/{id}", get(handlers::banking::get_account))
        .route("/payees", get(handlers::banking::list_payees))
        .route("/transfers", get(handlers::banking::list_transfers))
        .route("/loans/products", get(handlers::banking::loan_products))
        .route(
            "/loans/applications",
            get(handlers::banking::list_loan_applications),
        )
        .route("/loans/emi", post(handlers::banking::calculate));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness plus a few live counters.
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let streams = state.chat.streams();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "active_sessions": state.sessions.len(),
        "streams": streams.len(),
        "open_streams": streams.open_count(),
        "conversations": state.chat.history().len(),
    }))
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("request handler panicked");
    AppError::Chat(ChatError::Internal("internal server error".to_string())).into_response()
}
