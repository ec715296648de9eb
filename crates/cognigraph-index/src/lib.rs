//! CogniGraph Index — embeddings and nearest-neighbor retrieval.
//!
//! The `EmbedderBackend` trait abstracts over embedding generation.
//! When the `onnx` feature is enabled and model files are present,
//! `OnnxEmbedder` loads all-MiniLM-L6-v2 for 384-dim embeddings.
//! Otherwise the deterministic `HashingEmbedder` keeps retrieval
//! working (and reproducible) without any model files.

pub mod embedder;
pub mod hashing;
pub mod index;
pub mod onnx;

pub use embedder::EmbedderBackend;
pub use hashing::HashingEmbedder;
pub use index::{EmbeddingEntry, VectorIndex};

#[cfg(feature = "onnx")]
pub use onnx::OnnxEmbedder;

use std::path::Path;
use std::sync::Arc;

/// Create the best available embedder for the given model directory.
///
/// Tries ONNX first (if the feature is enabled and model files are
/// present), falls back to the hashing embedder.
pub fn create_embedder(model_dir: &Path, dim: usize) -> Arc<dyn EmbedderBackend> {
    #[cfg(feature = "onnx")]
    {
        match OnnxEmbedder::load(model_dir) {
            Ok(embedder) => {
                tracing::info!("using ONNX embedder (dim={})", embedder.dimension());
                return Arc::new(embedder);
            }
            Err(e) => {
                tracing::warn!("ONNX embedder unavailable: {}. Falling back to hashing.", e);
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    let _ = model_dir;

    tracing::info!("using hashing embedder (dim={})", dim);
    Arc::new(HashingEmbedder::new(dim))
}
