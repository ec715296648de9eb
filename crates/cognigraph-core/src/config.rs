//! Runtime configuration, sourced from environment variables.

use serde::{Deserialize, Serialize};

/// Top-level CogniGraph configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per chat question.
    pub top_k: usize,
    /// Concurrency cap for per-chunk graph extraction calls.
    pub extract_concurrency: usize,
    /// Fallback retry-after when the provider omits one.
    pub rate_limit_fallback_secs: u64,
    /// Embedding dimension (384 for all-MiniLM-L6-v2).
    pub embedding_dim: usize,
}

impl Config {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", 8000),
            chunk_size: env_parse("COGNIGRAPH_CHUNK_SIZE", 1000),
            chunk_overlap: env_parse("COGNIGRAPH_CHUNK_OVERLAP", 200),
            top_k: env_parse("COGNIGRAPH_TOP_K", 4),
            extract_concurrency: env_parse("COGNIGRAPH_EXTRACT_CONCURRENCY", 4),
            rate_limit_fallback_secs: env_parse("COGNIGRAPH_RATE_LIMIT_FALLBACK_SECS", 30),
            embedding_dim: 384,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            extract_concurrency: 4,
            rate_limit_fallback_secs: 30,
            embedding_dim: 384,
        }
    }
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
