//! HTTP route handlers.

pub mod chat;
pub mod graph;
pub mod upload;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;
use cognigraph_core::Error;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(graph::health))
        .route("/graph", get(graph::get_graph))
        .route("/upload", post(upload::upload))
        .route("/chat", post(chat::chat))
        .route("/reset", post(graph::reset))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Every request carries its opaque session id in this header; the
/// server never infers identity from anything else.
pub const SESSION_HEADER: &str = "x-session-id";

pub fn session_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ApiError(Error::InvalidRequest(format!(
                "missing {} header",
                SESSION_HEADER
            )))
        })
}
