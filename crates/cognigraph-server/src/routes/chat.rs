//! POST /chat — answer a question grounded in the session's document.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::session_id;
use crate::state::AppState;
use cognigraph_chat::SessionView;
use cognigraph_core::Error;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub model_provider: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub highlighted_nodes: Vec<String>,
    pub sources: Vec<String>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let sid = session_id(&headers)?;

    if req.message.trim().is_empty() {
        return Err(ApiError(Error::InvalidRequest("message is empty".into())));
    }

    let handle = if req.model_provider.trim().is_empty() {
        state.llm.resolve()
    } else {
        state.llm.resolve_named(&req.model_provider)
    }
    .ok_or_else(|| {
        Error::Provider("no generation provider configured; set a provider API key".into())
    })?;

    let session = state.session(&sid);
    let mut session = session.lock().await;

    // Split borrows: the engine reads chunks/graph/index and appends to
    // the transcript.
    let crate::state::Session {
        chunks,
        graph,
        index,
        transcript,
        ..
    } = &mut *session;

    let answer = state
        .engine
        .answer(
            &state.http,
            &handle,
            &state.guard,
            state.embedder.as_ref(),
            SessionView {
                chunks: chunks.as_slice(),
                graph: &*graph,
                index: &*index,
                transcript,
            },
            &req.message,
        )
        .await?;

    Ok(Json(ChatResponse {
        response: answer.text,
        highlighted_nodes: answer.highlighted_nodes,
        sources: answer.sources,
    }))
}
