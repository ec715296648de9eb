//! Deterministic feature-hashing embedder.
//!
//! Each token is hashed into a signed bucket of a fixed-dimension
//! vector, which is then L2-normalized. No model files, no randomness:
//! the same text always yields the same vector, which is what the
//! retrieval test fixtures rely on.

use ndarray::Array1;
use sha2::{Digest, Sha256};

use crate::embedder::EmbedderBackend;

pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        assert!(dim > 0, "embedding dimension must be positive");
        Self { dim }
    }

    fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
    }
}

impl EmbedderBackend for HashingEmbedder {
    fn embed(&self, text: &str) -> Option<Array1<f32>> {
        let mut vector = Array1::<f32>::zeros(self.dim);

        for token in Self::tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let bucket =
                u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize % self.dim;
            let sign = if digest[4] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.dot(&vector).sqrt();
        if norm > 0.0 {
            vector /= norm;
        }
        Some(vector)
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn name(&self) -> &'static str {
        "hashing"
    }
}
