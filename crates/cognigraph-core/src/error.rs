//! Error types for CogniGraph.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Graph extraction failed: {message}")]
    GraphExtractionFailed {
        message: String,
        /// Present when the underlying cause was a provider rate limit.
        retry_after_secs: Option<u64>,
    },

    #[error("Rate limit reached, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("No document has been uploaded for this session")]
    NoDocument,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Retry-after hint in seconds, when this error carries one.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Error::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            Error::GraphExtractionFailed {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_hint() {
        let err = Error::RateLimited {
            retry_after_secs: 45,
        };
        assert_eq!(err.retry_after_secs(), Some(45));

        let err = Error::GraphExtractionFailed {
            message: "all chunks failed".into(),
            retry_after_secs: Some(30),
        };
        assert_eq!(err.retry_after_secs(), Some(30));

        assert_eq!(Error::NoDocument.retry_after_secs(), None);
    }
}
