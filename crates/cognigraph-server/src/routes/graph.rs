//! Graph view, reset, and health routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::error::ApiError;
use crate::routes::session_id;
use crate::state::AppState;
use cognigraph_graph::GraphData;

/// GET /health — liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "online",
        "message": "CogniGraph backend is running",
    }))
}

/// GET /graph — the session's current graph.
pub async fn get_graph(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<GraphData>, ApiError> {
    let sid = session_id(&headers)?;
    let session = state.session(&sid);
    let session = session.lock().await;
    Ok(Json(session.graph.to_graph_data()))
}

/// POST /reset — drop the session's state and return the empty graph.
pub async fn reset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<GraphData>, ApiError> {
    let sid = session_id(&headers)?;
    let session = state.session(&sid);
    let mut session = session.lock().await;
    session.clear(state.config.embedding_dim);
    Ok(Json(session.graph.to_graph_data()))
}
