//! File text extraction: plain text, markdown, PDF.
//!
//! PDF pages keep their native text layer when one exists; a page whose
//! layer is near-empty is classified as scanned and routed through the
//! OCR engine. The decision is per page, so mixed native/scanned
//! documents come out in page order with both kinds of text.

use tracing::{debug, warn};

use crate::ocr::OcrEngine;
use cognigraph_core::{Error, Result};

/// A page with fewer meaningful characters than this is treated as scanned.
const SCANNED_PAGE_MIN_CHARS: usize = 20;

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    PlainText,
    Markdown,
    Pdf,
}

impl FileKind {
    /// Detect the format from the uploaded filename's extension.
    pub fn from_name(filename: &str) -> Option<Self> {
        let ext = filename.rsplit('.').next().unwrap_or("");
        match ext.to_lowercase().as_str() {
            "txt" | "text" => Some(Self::PlainText),
            "md" | "markdown" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Extract plain text from uploaded bytes. Blocking: PDF parsing and OCR
/// are CPU/subprocess work, so call through `spawn_blocking` from async
/// contexts.
pub fn extract(bytes: &[u8], filename: &str, ocr: &dyn OcrEngine) -> Result<String> {
    let kind = FileKind::from_name(filename)
        .ok_or_else(|| Error::UnsupportedFormat(filename.to_string()))?;

    let text = match kind {
        FileKind::PlainText | FileKind::Markdown => String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::ExtractionFailed("file is not valid UTF-8 text".into()))?,
        FileKind::Pdf => extract_pdf(bytes, ocr)?,
    };

    if meaningful_chars(&text) == 0 {
        return Err(Error::ExtractionFailed(
            "no usable text could be recovered from the file".into(),
        ));
    }

    Ok(text)
}

/// Per-page PDF extraction with OCR fallback for scanned pages.
fn extract_pdf(bytes: &[u8], ocr: &dyn OcrEngine) -> Result<String> {
    let native_pages = match pdf_extract::extract_text_from_mem_by_pages(bytes) {
        Ok(pages) => pages,
        Err(e) => {
            // The text layer is unreadable; treat every page as scanned.
            warn!("native PDF extraction failed: {}", e);
            vec![String::new(); page_count(bytes)?]
        }
    };

    let mut pages = Vec::with_capacity(native_pages.len());
    for (i, native) in native_pages.iter().enumerate() {
        let page_no = (i + 1) as u32;

        if !is_scanned_page(native) {
            pages.push(native.clone());
            continue;
        }

        debug!("page {} looks scanned, attempting OCR", page_no);
        if !ocr.is_available() {
            warn!("page {} needs OCR but no engine is available", page_no);
            pages.push(native.clone());
            continue;
        }

        match ocr.ocr_pdf_page(bytes, page_no) {
            Ok(Some(text)) => pages.push(text),
            Ok(None) => {
                warn!("OCR produced no text for page {}", page_no);
                pages.push(String::new());
            }
            Err(e) => {
                // One bad page must not sink the document.
                warn!("OCR failed for page {}: {}", page_no, e);
                pages.push(String::new());
            }
        }
    }

    Ok(pages.join("\n"))
}

/// Page count via the document catalog, for PDFs whose text layer failed.
fn page_count(bytes: &[u8]) -> Result<usize> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| Error::ExtractionFailed(format!("could not parse PDF: {}", e)))?;
    let count = doc.get_pages().len();
    if count == 0 {
        return Err(Error::ExtractionFailed("PDF contains no pages".into()));
    }
    Ok(count)
}

/// A page is "scanned" when its native text layer is near-empty.
fn is_scanned_page(native_text: &str) -> bool {
    meaningful_chars(native_text) < SCANNED_PAGE_MIN_CHARS
}

fn meaningful_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::NoopOcr;

    #[test]
    fn test_file_kind_detection() {
        assert_eq!(FileKind::from_name("notes.txt"), Some(FileKind::PlainText));
        assert_eq!(FileKind::from_name("README.md"), Some(FileKind::Markdown));
        assert_eq!(FileKind::from_name("paper.PDF"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_name("image.png"), None);
        assert_eq!(FileKind::from_name("no_extension"), None);
    }

    #[test]
    fn test_plain_text_roundtrip() {
        let text = extract(b"Alice works at Acme Corp.", "doc.txt", &NoopOcr).unwrap();
        assert_eq!(text, "Alice works at Acme Corp.");
    }

    #[test]
    fn test_invalid_utf8_is_extraction_failure() {
        let err = extract(&[0xff, 0xfe, 0x00], "doc.txt", &NoopOcr).unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let err = extract(b"data", "doc.docx", &NoopOcr).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_whitespace_only_text_is_extraction_failure() {
        let err = extract(b"   \n\t  ", "doc.txt", &NoopOcr).unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }

    #[test]
    fn test_meaningful_chars_ignores_whitespace() {
        assert_eq!(meaningful_chars("  a b\nc  "), 3);
        assert_eq!(meaningful_chars("\n\t "), 0);
    }

    #[test]
    fn test_scanned_page_classification() {
        assert!(is_scanned_page(""));
        assert!(is_scanned_page("  \n\x0C  "));
        // Page numbers and stray header glyphs alone stay below the bar.
        assert!(is_scanned_page("  3  "));
        assert!(!is_scanned_page(
            "This page has a real native text layer with plenty of content."
        ));
    }
}
