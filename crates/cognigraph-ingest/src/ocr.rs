//! OCR engines for scanned PDF pages.
//!
//! The `OcrEngine` trait abstracts over page-image OCR. `TesseractCli`
//! renders the page with poppler's `pdftoppm` and reads it with the
//! `tesseract` binary; `NoopOcr` is used when neither tool is installed,
//! leaving scanned pages empty rather than failing the upload.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;

use tracing::{debug, info, warn};

use cognigraph_core::{Error, Result};

/// Trait for OCR backends.
pub trait OcrEngine: Send + Sync {
    /// Engine name for logging.
    fn name(&self) -> &'static str;

    /// Whether the engine can actually run on this host.
    fn is_available(&self) -> bool;

    /// OCR a single 1-based PDF page. `Ok(None)` means the engine ran but
    /// recognized nothing.
    fn ocr_pdf_page(&self, pdf_bytes: &[u8], page: u32) -> Result<Option<String>>;
}

/// Tesseract CLI engine: `pdftoppm` renders the page at 300 dpi, then
/// `tesseract <image> stdout` reads it.
pub struct TesseractCli {
    language: String,
}

impl TesseractCli {
    /// Probe for the required binaries; None if either is missing.
    pub fn detect(language: &str) -> Option<Self> {
        if !binary_works("pdftoppm", "-v") || !binary_works("tesseract", "--version") {
            return None;
        }
        Some(Self {
            language: language.to_string(),
        })
    }
}

fn binary_works(name: &str, probe_arg: &str) -> bool {
    Command::new(name)
        .arg(probe_arg)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

impl OcrEngine for TesseractCli {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn ocr_pdf_page(&self, pdf_bytes: &[u8], page: u32) -> Result<Option<String>> {
        let workdir = tempfile::tempdir()?;
        let pdf_path = workdir.path().join("page.pdf");
        std::fs::File::create(&pdf_path)?.write_all(pdf_bytes)?;

        let page_arg = page.to_string();
        let prefix = workdir.path().join("render");
        let status = Command::new("pdftoppm")
            .args(["-f", &page_arg, "-l", &page_arg, "-r", "300", "-png"])
            .arg(&pdf_path)
            .arg(&prefix)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| Error::Internal(format!("pdftoppm spawn failed: {}", e)))?;
        if !status.success() {
            return Err(Error::Internal(format!(
                "pdftoppm exited with {} for page {}",
                status, page
            )));
        }

        // pdftoppm pads page numbers in its output name; just take the
        // one PNG it wrote.
        let image = std::fs::read_dir(workdir.path())?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .find(|p| p.extension().is_some_and(|e| e == "png"))
            .ok_or_else(|| Error::Internal(format!("pdftoppm wrote no image for page {}", page)))?;

        let output = Command::new("tesseract")
            .arg(&image)
            .arg("stdout")
            .args(["-l", &self.language])
            .stderr(Stdio::null())
            .output()
            .map_err(|e| Error::Internal(format!("tesseract spawn failed: {}", e)))?;
        if !output.status.success() {
            return Err(Error::Internal(format!(
                "tesseract exited with {} for page {}",
                output.status, page
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("OCR page {}: {} chars recognized", page, text.len());
        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }
}

/// Placeholder engine for hosts without poppler/tesseract.
pub struct NoopOcr;

impl OcrEngine for NoopOcr {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn ocr_pdf_page(&self, _pdf_bytes: &[u8], _page: u32) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Create the best available OCR engine for this host.
pub fn create_engine() -> Arc<dyn OcrEngine> {
    match TesseractCli::detect("eng") {
        Some(engine) => {
            info!("OCR engine: tesseract via pdftoppm");
            Arc::new(engine)
        }
        None => {
            warn!("pdftoppm/tesseract not found; scanned PDF pages will be skipped");
            Arc::new(NoopOcr)
        }
    }
}
