//! Embedding backend trait.

use ndarray::Array1;

/// Trait for embedding backends.
pub trait EmbedderBackend: Send + Sync {
    /// Generate an embedding for a text string. Returns None when the
    /// backend could not produce a vector for this input.
    fn embed(&self, text: &str) -> Option<Array1<f32>>;

    /// Generate embeddings for a batch of texts.
    fn embed_batch(&self, texts: &[&str]) -> Vec<Option<Array1<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// The embedding dimension.
    fn dimension(&self) -> usize;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}
