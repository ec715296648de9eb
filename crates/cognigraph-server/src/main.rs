//! CogniGraph — document → knowledge graph → grounded chat server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod ingestion;
mod routes;
mod state;

use state::AppState;

fn resolve_model_dir() -> PathBuf {
    std::env::var("COGNIGRAPH_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("models"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = cognigraph_core::Config::from_env();
    let port = config.port;

    let llm = cognigraph_llm::LlmConfig::from_env();
    let embedder = cognigraph_index::create_embedder(&resolve_model_dir(), config.embedding_dim);
    let ocr = cognigraph_ingest::create_engine();

    let state = Arc::new(AppState::new(config, llm, embedder, ocr));
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("CogniGraph server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
