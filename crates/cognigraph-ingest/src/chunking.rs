//! Fixed-size chunking with overlap.
//!
//! Chunk size 1000 chars with 200 char overlap; the overlap preserves
//! relation context spanning chunk boundaries. Chunk ids are derived from
//! the session id plus sequence number so that re-chunking the same text
//! in a different session never collides with another session's ids.

use serde::Serialize;

/// A bounded, ordered slice of extracted document text.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    /// Stable id: `"{session_id}:{sequence}"`.
    pub id: String,
    pub text: String,
    pub sequence: usize,
    /// Start offset into the source text, in characters.
    pub start_char: usize,
    /// End offset into the source text, in characters (exclusive).
    pub end_char: usize,
}

/// Split text into overlapping chunks. Deterministic: the same text always
/// yields the same boundaries and, for the same session id, the same ids.
pub fn chunk_text(session_id: &str, text: &str, size: usize, overlap: usize) -> Vec<Chunk> {
    assert!(size > 0, "chunk size must be positive");
    assert!(overlap < size, "overlap must be smaller than chunk size");

    // Byte offset of every char, so slicing stays on char boundaries.
    let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let total_chars = offsets.len();

    let mut chunks = Vec::new();
    let step = size - overlap;
    let mut start = 0usize;

    while start < total_chars {
        let end = (start + size).min(total_chars);
        let byte_start = offsets[start];
        let byte_end = offsets.get(end).copied().unwrap_or(text.len());

        let sequence = chunks.len();
        chunks.push(Chunk {
            id: format!("{}:{}", session_id, sequence),
            text: text[byte_start..byte_end].to_string(),
            sequence,
            start_char: start,
            end_char: end,
        });

        if end == total_chars {
            break;
        }
        start += step;
    }

    chunks
}
