//! Upload ingestion: extract → chunk → {graph, index} → replace session.
//!
//! The session lock is held for the whole pipeline, so a chat request
//! for the same session can never observe a half-replaced graph or
//! index. Other sessions are untouched.

use std::time::Instant;

use tracing::info;

use cognigraph_core::{Error, Result};
use cognigraph_graph::{GraphData, GraphExtractor};
use cognigraph_index::VectorIndex;
use cognigraph_ingest::{chunk_text, extract};

use crate::state::AppState;

pub async fn ingest_upload(
    state: &AppState,
    session_id: &str,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<GraphData> {
    let session_id = session_id.to_string();
    let filename = filename.to_string();

    let handle = state.llm.resolve().ok_or_else(|| {
        Error::Provider("no generation provider configured; set a provider API key".into())
    })?;

    let session = state.session(&session_id);
    let mut session = session.lock().await;

    let started = Instant::now();

    // PDF parsing and OCR are blocking work.
    let ocr = state.ocr.clone();
    let owned_name = filename.to_string();
    let text = tokio::task::spawn_blocking(move || extract(&bytes, &owned_name, ocr.as_ref()))
        .await
        .map_err(|e| Error::Internal(format!("extraction task panicked: {}", e)))??;

    let chunks = chunk_text(
        &session_id,
        &text,
        state.config.chunk_size,
        state.config.chunk_overlap,
    );
    info!(
        "extracted {} chars into {} chunks from {}",
        text.chars().count(),
        chunks.len(),
        filename
    );

    let extractor = GraphExtractor::new(
        handle,
        state.guard.clone(),
        state.config.extract_concurrency,
    );
    let graph = extractor.extract(&state.http, &chunks).await?;

    let embedder = state.embedder.clone();
    let index_chunks = chunks.clone();
    let index =
        tokio::task::spawn_blocking(move || VectorIndex::build(embedder.as_ref(), &index_chunks))
            .await
            .map_err(|e| Error::Internal(format!("indexing task panicked: {}", e)))??;

    // Replace, never merge: the session becomes this document.
    session.document_text = text;
    session.chunks = chunks;
    session.graph = graph;
    session.index = index;
    session.transcript.clear();

    info!(
        "ingested {} for session {} in {:.2}s ({} nodes, {} edges)",
        filename,
        session_id,
        started.elapsed().as_secs_f64(),
        session.graph.node_count(),
        session.graph.edge_count()
    );

    Ok(session.graph.to_graph_data())
}
