//! Per-session vector index.
//!
//! Embeddings are computed once per chunk at build time and never
//! recomputed. Similarity is the inner product of L2-normalized vectors
//! (cosine); ties break on chunk sequence so a fixed index and query
//! always return the same ordered top-k.

use ndarray::Array1;
use tracing::debug;

use cognigraph_core::{Error, Result};
use cognigraph_ingest::Chunk;

use crate::embedder::EmbedderBackend;

/// One embedded chunk.
pub struct EmbeddingEntry {
    pub chunk_id: String,
    pub sequence: usize,
    vector: Array1<f32>,
}

/// The session's nearest-neighbor index, 1:1 with its chunks.
pub struct VectorIndex {
    entries: Vec<EmbeddingEntry>,
    dim: usize,
}

impl VectorIndex {
    pub fn empty(dim: usize) -> Self {
        Self {
            entries: Vec::new(),
            dim,
        }
    }

    /// Embed every chunk and build the index.
    pub fn build(embedder: &dyn EmbedderBackend, chunks: &[Chunk]) -> Result<Self> {
        let mut entries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let vector = embedder.embed(&chunk.text).ok_or_else(|| {
                Error::Internal(format!(
                    "{} embedder produced no vector for chunk {}",
                    embedder.name(),
                    chunk.id
                ))
            })?;
            entries.push(EmbeddingEntry {
                chunk_id: chunk.id.clone(),
                sequence: chunk.sequence,
                vector: l2_normalize(vector),
            });
        }

        debug!("built vector index with {} entries", entries.len());
        Ok(Self {
            entries,
            dim: embedder.dimension(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Top-k most similar chunks to the query text, best first.
    pub fn query(
        &self,
        embedder: &dyn EmbedderBackend,
        text: &str,
        k: usize,
    ) -> Result<Vec<(String, f32)>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query = embedder.embed(text).ok_or_else(|| {
            Error::Internal(format!(
                "{} embedder produced no vector for the query",
                embedder.name()
            ))
        })?;
        let query = l2_normalize(query);

        let mut scored: Vec<(&EmbeddingEntry, f32)> = self
            .entries
            .iter()
            .map(|e| (e, e.vector.dot(&query)))
            .collect();

        scored.sort_by(|(a, sa), (b, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.sequence.cmp(&b.sequence))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(e, score)| (e.chunk_id.clone(), score))
            .collect())
    }
}

fn l2_normalize(mut v: Array1<f32>) -> Array1<f32> {
    let norm = v.dot(&v).sqrt();
    if norm > 0.0 {
        v /= norm;
    }
    v
}
