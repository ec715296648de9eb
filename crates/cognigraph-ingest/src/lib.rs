//! CogniGraph Ingest — upload bytes to chunked text.
//!
//! `extract` turns an uploaded file (plain text, markdown, PDF) into a
//! single string, falling back to per-page OCR for scanned PDF pages.
//! `chunk_text` splits the result into overlapping, stably-identified
//! chunks — the unit both graph extraction and retrieval operate on.

pub mod chunking;
pub mod extract;
pub mod ocr;

pub use chunking::{chunk_text, Chunk};
pub use extract::{extract, FileKind};
pub use ocr::{create_engine, NoopOcr, OcrEngine, TesseractCli};
