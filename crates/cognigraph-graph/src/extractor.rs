//! Per-chunk structured extraction and graph merging.
//!
//! One provider call per chunk, bounded fan-out, then a deterministic
//! merge in chunk order. A chunk whose response fails schema validation
//! is dropped for that chunk only; extraction as a whole fails only when
//! every provider call failed.

use futures::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use cognigraph_core::{Error, Result};
use cognigraph_ingest::Chunk;
use cognigraph_llm::{ChatMessage, CompletionRequest, ProviderHandle, RateLimitGuard};

use crate::model::{KnowledgeGraph, NodeType};

/// One entity as reported by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct EntitySpec {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub entity_type: String,
}

/// One relation as reported by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationSpec {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub label: String,
}

/// The fixed response schema the extraction prompt requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkExtraction {
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
    #[serde(default)]
    pub relations: Vec<RelationSpec>,
}

/// Outcome of parsing one chunk's response: valid extraction, or the raw
/// text kept for logging when validation failed.
#[derive(Debug)]
pub enum ChunkOutcome {
    Parsed(ChunkExtraction),
    SchemaError(String),
}

static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Parse a provider response into the extraction schema, tolerating
/// markdown fences and prose around the JSON object.
pub fn parse_extraction(raw: &str) -> ChunkOutcome {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    if let Ok(extraction) = serde_json::from_str::<ChunkExtraction>(cleaned) {
        return ChunkOutcome::Parsed(extraction);
    }

    // Salvage: the outermost brace-delimited object, if any.
    if let Some(m) = JSON_OBJECT.find(cleaned) {
        if let Ok(extraction) = serde_json::from_str::<ChunkExtraction>(m.as_str()) {
            return ChunkOutcome::Parsed(extraction);
        }
    }

    ChunkOutcome::SchemaError(raw.to_string())
}

/// Drives the generation provider over chunks and merges the results.
pub struct GraphExtractor {
    handle: ProviderHandle,
    guard: RateLimitGuard,
    concurrency: usize,
}

impl GraphExtractor {
    pub fn new(handle: ProviderHandle, guard: RateLimitGuard, concurrency: usize) -> Self {
        Self {
            handle,
            guard,
            concurrency: concurrency.max(1),
        }
    }

    /// Extract a merged graph from all chunks.
    pub async fn extract(&self, client: &Client, chunks: &[Chunk]) -> Result<KnowledgeGraph> {
        if chunks.is_empty() {
            return Ok(KnowledgeGraph::new());
        }

        let guard = self.guard.clone();
        let handle = self.handle.clone();
        let client = client.clone();
        let requests: Vec<(usize, CompletionRequest)> = chunks
            .iter()
            .map(|chunk| (chunk.sequence, self.completion_request(chunk)))
            .collect();
        let mut results: Vec<(usize, Result<ChunkOutcome>)> =
            futures::stream::iter(requests.into_iter().map(|(sequence, req)| {
                let guard = guard.clone();
                let handle = handle.clone();
                let client = client.clone();
                async move {
                    let outcome = guard
                        .call(&client, &handle, &req)
                        .await
                        .map(|raw| parse_extraction(&raw));
                    (sequence, outcome)
                }
            }))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        // Merge in chunk order so the graph is the same for any fan-out
        // interleaving.
        results.sort_by_key(|(sequence, _)| *sequence);

        let mut graph = KnowledgeGraph::new();
        let mut calls_succeeded = 0usize;
        let mut schema_failures = 0usize;
        let mut last_error: Option<Error> = None;
        let mut rate_limit_hint: Option<u64> = None;

        for (sequence, outcome) in results {
            let chunk = &chunks[sequence];
            match outcome {
                Ok(ChunkOutcome::Parsed(extraction)) => {
                    calls_succeeded += 1;
                    merge_chunk(&mut graph, &chunk.id, extraction);
                }
                Ok(ChunkOutcome::SchemaError(raw)) => {
                    calls_succeeded += 1;
                    schema_failures += 1;
                    warn!(
                        "chunk {} returned unparseable extraction ({} chars), skipping",
                        chunk.id,
                        raw.len()
                    );
                }
                Err(e) => {
                    if let Some(secs) = e.retry_after_secs() {
                        rate_limit_hint = Some(secs);
                    }
                    warn!("extraction call failed for chunk {}: {}", chunk.id, e);
                    last_error = Some(e);
                }
            }
        }

        if calls_succeeded == 0 {
            let message = match last_error {
                Some(e) => format!("every extraction call failed; last error: {}", e),
                None => "every extraction call failed".to_string(),
            };
            return Err(Error::GraphExtractionFailed {
                message,
                retry_after_secs: rate_limit_hint,
            });
        }

        info!(
            "graph extraction: {} nodes, {} edges from {}/{} chunks ({} schema failures)",
            graph.node_count(),
            graph.edge_count(),
            calls_succeeded,
            chunks.len(),
            schema_failures
        );

        Ok(graph)
    }

    fn completion_request(&self, chunk: &Chunk) -> CompletionRequest {
        // Relation target scales with passage size so short chunks are
        // not pushed into hallucinating.
        let target = (chunk.text.chars().count() / 100).clamp(5, 15);

        let prompt = format!(
            "Extract a knowledge graph from the passage below.\n\
             Return ONLY a JSON object in this exact shape:\n\
             {{\"entities\": [{{\"name\": \"...\", \"type\": \"person|organization|concept|other\"}}],\n \
             \"relations\": [{{\"source\": \"...\", \"target\": \"...\", \"label\": \"...\"}}]}}\n\n\
             Rules:\n\
             - Include only entities and relations stated in the passage itself.\n\
             - Every relation's source and target must appear in the entities list.\n\
             - Use short verb phrases as relation labels (e.g. \"works at\", \"founded\").\n\
             - Aim for up to {} relations; fewer is fine if the passage is sparse. Do not invent any.\n\n\
             Passage:\n{}",
            target, chunk.text
        );

        CompletionRequest {
            messages: vec![
                ChatMessage::system("You are a JSON-speaking API."),
                ChatMessage::user(prompt),
            ],
            temperature: 0.1,
            max_tokens: 2000,
            json_mode: true,
        }
    }
}

/// Fold one chunk's validated extraction into the graph.
fn merge_chunk(graph: &mut KnowledgeGraph, chunk_id: &str, extraction: ChunkExtraction) {
    for entity in &extraction.entities {
        graph.upsert_node(&entity.name, NodeType::parse(&entity.entity_type), chunk_id);
    }
    for relation in &extraction.relations {
        graph.upsert_edge(&relation.source, &relation.target, &relation.label, chunk_id);
    }
    debug!(
        "merged chunk {}: {} entities, {} relations",
        chunk_id,
        extraction.entities.len(),
        extraction.relations.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_json() {
        let raw = r#"{"entities":[{"name":"Alice","type":"person"}],"relations":[]}"#;
        match parse_extraction(raw) {
            ChunkOutcome::Parsed(e) => {
                assert_eq!(e.entities.len(), 1);
                assert_eq!(e.entities[0].name, "Alice");
            }
            ChunkOutcome::SchemaError(_) => panic!("expected parse"),
        }
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"entities\":[],\"relations\":[{\"source\":\"a\",\"target\":\"b\",\"label\":\"x\"}]}\n```";
        match parse_extraction(raw) {
            ChunkOutcome::Parsed(e) => assert_eq!(e.relations.len(), 1),
            ChunkOutcome::SchemaError(_) => panic!("expected parse"),
        }
    }

    #[test]
    fn test_parse_salvages_embedded_object() {
        let raw = "Here is the graph you asked for:\n{\"entities\":[{\"name\":\"Acme\",\"type\":\"organization\"}],\"relations\":[]}\nHope this helps!";
        match parse_extraction(raw) {
            ChunkOutcome::Parsed(e) => assert_eq!(e.entities[0].name, "Acme"),
            ChunkOutcome::SchemaError(_) => panic!("expected salvage"),
        }
    }

    #[test]
    fn test_parse_garbage_is_schema_error() {
        match parse_extraction("I could not process this request.") {
            ChunkOutcome::SchemaError(raw) => assert!(raw.contains("could not")),
            ChunkOutcome::Parsed(_) => panic!("expected schema error"),
        }
    }

    #[test]
    fn test_parse_tolerates_missing_fields() {
        // Providers sometimes omit one of the arrays entirely.
        match parse_extraction(r#"{"entities":[{"name":"X"}]}"#) {
            ChunkOutcome::Parsed(e) => {
                assert_eq!(e.entities.len(), 1);
                assert!(e.relations.is_empty());
                assert_eq!(e.entities[0].entity_type, "");
            }
            ChunkOutcome::SchemaError(_) => panic!("expected parse"),
        }
    }

    #[test]
    fn test_merge_chunk_builds_connected_graph() {
        let mut graph = KnowledgeGraph::new();
        let extraction = ChunkExtraction {
            entities: vec![
                EntitySpec {
                    name: "Alice".into(),
                    entity_type: "person".into(),
                },
                EntitySpec {
                    name: "Acme Corp".into(),
                    entity_type: "organization".into(),
                },
            ],
            relations: vec![RelationSpec {
                source: "Alice".into(),
                target: "Acme Corp".into(),
                label: "works at".into(),
            }],
        };

        merge_chunk(&mut graph, "s:0", extraction);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(
            graph.get_node("alice").unwrap().node_type,
            NodeType::Person
        );
        assert_eq!(
            graph.get_node("acme corp").unwrap().node_type,
            NodeType::Organization
        );
    }

    #[test]
    fn test_merge_across_chunks_unions_mentions() {
        let mut graph = KnowledgeGraph::new();
        for (chunk_id, name) in [("s:0", "OpenAI"), ("s:1", " openai "), ("s:2", "OPENAI")] {
            merge_chunk(
                &mut graph,
                chunk_id,
                ChunkExtraction {
                    entities: vec![EntitySpec {
                        name: name.into(),
                        entity_type: "organization".into(),
                    }],
                    relations: vec![],
                },
            );
        }

        assert_eq!(graph.node_count(), 1);
        let node = graph.get_node("openai").unwrap();
        assert_eq!(
            node.mentions.iter().cloned().collect::<Vec<_>>(),
            vec!["s:0", "s:1", "s:2"]
        );
    }
}
