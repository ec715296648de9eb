//! Shared application state and the per-session store.
//!
//! Sessions live in a concurrency-safe map keyed by the opaque session
//! identifier. Each entry carries its own async mutex: operations on one
//! session are mutually exclusive, operations on different sessions
//! never block each other. Nothing is persisted; a restart drops all
//! sessions.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use cognigraph_chat::RetrievalChatEngine;
use cognigraph_core::Config;
use cognigraph_graph::KnowledgeGraph;
use cognigraph_index::{EmbedderBackend, VectorIndex};
use cognigraph_ingest::{Chunk, OcrEngine};
use cognigraph_llm::{ChatMessage, LlmConfig, RateLimitGuard};

/// One client's isolated state: document, graph, index, transcript.
pub struct Session {
    pub document_text: String,
    pub chunks: Vec<Chunk>,
    pub graph: KnowledgeGraph,
    pub index: VectorIndex,
    pub transcript: Vec<ChatMessage>,
}

impl Session {
    pub fn empty(dim: usize) -> Self {
        Self {
            document_text: String::new(),
            chunks: Vec::new(),
            graph: KnowledgeGraph::new(),
            index: VectorIndex::empty(dim),
            transcript: Vec::new(),
        }
    }

    /// Drop all fields together, as reset does.
    pub fn clear(&mut self, dim: usize) {
        *self = Self::empty(dim);
    }

    pub fn has_document(&self) -> bool {
        !self.chunks.is_empty()
    }
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: Config,
    pub llm: LlmConfig,
    pub embedder: Arc<dyn EmbedderBackend>,
    pub ocr: Arc<dyn OcrEngine>,
    pub http: reqwest::Client,
    pub guard: RateLimitGuard,
    pub engine: RetrievalChatEngine,
    sessions: DashMap<String, Arc<Mutex<Session>>>,
}

impl AppState {
    pub fn new(
        config: Config,
        llm: LlmConfig,
        embedder: Arc<dyn EmbedderBackend>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        let guard = RateLimitGuard::new(config.rate_limit_fallback_secs);
        let engine = RetrievalChatEngine::new(config.top_k);
        Self {
            config,
            llm,
            embedder,
            ocr,
            http: reqwest::Client::new(),
            guard,
            engine,
            sessions: DashMap::new(),
        }
    }

    /// Get the handle for a session, creating it lazily on first use.
    pub fn session(&self, session_id: &str) -> Arc<Mutex<Session>> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!("creating session {}", session_id);
                Arc::new(Mutex::new(Session::empty(self.config.embedding_dim)))
            })
            .value()
            .clone()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognigraph_graph::NodeType;
    use cognigraph_index::HashingEmbedder;
    use cognigraph_ingest::NoopOcr;

    fn test_state() -> AppState {
        let config = Config::default();
        let llm = LlmConfig {
            preferred_provider: "auto".into(),
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            github_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            anthropic_model: "claude-3-5-haiku-20241022".into(),
            groq_model: "llama-3.3-70b-versatile".into(),
            github_model: "gpt-4o-mini".into(),
        };
        AppState::new(
            config,
            llm,
            Arc::new(HashingEmbedder::new(64)),
            Arc::new(NoopOcr),
        )
    }

    #[tokio::test]
    async fn test_sessions_are_created_lazily() {
        let state = test_state();
        assert_eq!(state.session_count(), 0);

        let _a = state.session("a");
        let _b = state.session("b");
        assert_eq!(state.session_count(), 2);

        // Same id returns the same handle.
        let a1 = state.session("a");
        let a2 = state.session("a");
        assert!(Arc::ptr_eq(&a1, &a2));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let state = test_state();

        {
            let handle = state.session("a");
            let mut session = handle.lock().await;
            session.document_text = "doc for a".into();
            session.graph.upsert_node("Alice", NodeType::Person, "a:0");
            session.transcript.push(ChatMessage::user("question"));
        }

        let handle = state.session("b");
        let session = handle.lock().await;
        assert!(session.document_text.is_empty());
        assert!(session.graph.is_empty());
        assert!(session.transcript.is_empty());
    }

    #[tokio::test]
    async fn test_reset_drops_all_fields_together() {
        let state = test_state();
        let handle = state.session("a");

        {
            let mut session = handle.lock().await;
            session.document_text = "text".into();
            session.chunks.push(Chunk {
                id: "a:0".into(),
                text: "text".into(),
                sequence: 0,
                start_char: 0,
                end_char: 4,
            });
            session.graph.upsert_node("Alice", NodeType::Person, "a:0");
            session.transcript.push(ChatMessage::user("q"));
            assert!(session.has_document());

            session.clear(64);
            assert!(!session.has_document());
            assert!(session.graph.is_empty());
            assert!(session.transcript.is_empty());
            assert!(session.index.is_empty());
        }
    }

    #[tokio::test]
    async fn test_per_session_mutual_exclusion() {
        let state = Arc::new(test_state());
        let handle = state.session("a");

        // Hold the lock, then show a second task cannot acquire it until
        // released while a different session proceeds immediately.
        let held = handle.lock().await;

        let other = state.session("b");
        assert!(other.try_lock().is_ok());
        assert!(handle.try_lock().is_err());

        drop(held);
        assert!(handle.try_lock().is_ok());
    }
}
