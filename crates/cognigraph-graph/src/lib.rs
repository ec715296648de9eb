//! CogniGraph Graph — entity/relation extraction and the merged graph.
//!
//! `GraphExtractor` drives one structured generation call per chunk and
//! merges the per-chunk results into a single deduplicated
//! `KnowledgeGraph`. Entity identity is the normalized name (trimmed,
//! case-folded, whitespace-collapsed); no fuzzy alias merging.

pub mod extractor;
pub mod model;

pub use extractor::{parse_extraction, ChunkExtraction, ChunkOutcome, GraphExtractor};
pub use model::{normalize_name, GraphData, GraphEdge, GraphNode, KnowledgeGraph, NodeType};
