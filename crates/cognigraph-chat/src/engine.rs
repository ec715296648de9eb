//! The retrieval chat engine.

use std::collections::HashSet;

use reqwest::Client;
use tracing::{debug, info};

use cognigraph_core::{Error, Result};
use cognigraph_graph::KnowledgeGraph;
use cognigraph_index::{EmbedderBackend, VectorIndex};
use cognigraph_ingest::Chunk;
use cognigraph_llm::{ChatMessage, CompletionRequest, ProviderHandle, RateLimitGuard};

use crate::highlight;

/// Borrowed view of one session's state, taken under its lock.
pub struct SessionView<'a> {
    pub chunks: &'a [Chunk],
    pub graph: &'a KnowledgeGraph,
    pub index: &'a VectorIndex,
    pub transcript: &'a mut Vec<ChatMessage>,
}

/// A grounded answer with the node ids the client should highlight.
#[derive(Debug, Clone)]
pub struct ChatAnswer {
    pub text: String,
    pub highlighted_nodes: Vec<String>,
    /// Retrieved chunk excerpts the answer was grounded in.
    pub sources: Vec<String>,
}

pub struct RetrievalChatEngine {
    top_k: usize,
}

impl RetrievalChatEngine {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    /// Answer a question from the session's document.
    pub async fn answer(
        &self,
        client: &Client,
        handle: &ProviderHandle,
        guard: &RateLimitGuard,
        embedder: &dyn EmbedderBackend,
        session: SessionView<'_>,
        question: &str,
    ) -> Result<ChatAnswer> {
        if session.chunks.is_empty() {
            return Err(Error::NoDocument);
        }

        let hits = session.index.query(embedder, question, self.top_k)?;
        debug!("retrieved {} chunks for question", hits.len());

        let retrieved_ids: HashSet<String> = hits.iter().map(|(id, _)| id.clone()).collect();
        let excerpts: Vec<String> = hits
            .iter()
            .filter_map(|(id, _)| {
                session
                    .chunks
                    .iter()
                    .find(|c| &c.id == id)
                    .map(|c| c.text.clone())
            })
            .collect();

        let messages = build_messages(session.graph, &excerpts, question);
        let req = CompletionRequest {
            messages,
            temperature: 0.1,
            max_tokens: 1024,
            json_mode: false,
        };

        let text = guard.call(client, handle, &req).await?;

        let retrieved_text = excerpts.join("\n");
        let highlighted_nodes =
            highlight::select_nodes(session.graph, &text, &retrieved_ids, &retrieved_text);

        session.transcript.push(ChatMessage::user(question));
        session.transcript.push(ChatMessage::assistant(text.clone()));

        info!(
            "answered with {} highlighted nodes from {} excerpts",
            highlighted_nodes.len(),
            excerpts.len()
        );

        Ok(ChatAnswer {
            text,
            highlighted_nodes,
            sources: excerpts,
        })
    }
}

/// Grounding prompt: graph relationships plus retrieved excerpts, with an
/// explicit instruction to decline when the context has no answer.
fn build_messages(
    graph: &KnowledgeGraph,
    excerpts: &[String],
    question: &str,
) -> Vec<ChatMessage> {
    let graph_context = graph.triples_as_text();
    let excerpt_block = excerpts.join("\n\n");

    let context = if graph_context.is_empty() {
        format!("Document excerpts:\n{}", excerpt_block)
    } else {
        format!("{}\nDocument excerpts:\n{}", graph_context, excerpt_block)
    };

    vec![
        ChatMessage::system(
            "You are a helpful assistant for a knowledge graph application. \
             Use BOTH the graph relationships and the document excerpts to answer. \
             If the answer is NOT in the provided context, simply say \
             'This information is not available in the uploaded document.'",
        ),
        ChatMessage::user(format!(
            "Context:\n{}\n\nUser question: {}\n\n\
             Answer ONLY using the information above. \
             If the answer is not found, say so clearly.",
            context, question
        )),
    ]
}
