use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open document: {0}")]
    Open(String),
    #[error("text extraction failed: {0}")]
    Extraction(String),
    #[error("page render failed: {0}")]
    Render(String),
    #[error("OCR failed: {0}")]
    Ocr(String),
}

/// Read access to a PDF document: native text layer, page count, and
/// per-page rasterization for OCR.
///
/// Implementations live in separate crates so that non-PDF code paths do
/// not transitively depend on the rendering library.
pub trait PdfSource: Send + Sync {
    /// Extract the native text layer of every page, in page order.
    ///
    /// An empty or garbage text layer is not an error; callers decide
    /// whether the result is usable.
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;

    fn page_count(&self, path: &Path) -> Result<usize, BackendError>;

    /// Render one page (0-based) to PNG bytes at the given resolution.
    fn render_page_png(&self, path: &Path, page_index: usize, dpi: u32)
    -> Result<Vec<u8>, BackendError>;
}

/// Opaque OCR capability: image in, recognized (possibly noisy) text out.
pub trait OcrEngine: Send + Sync {
    fn recognize_png(&self, png: &[u8]) -> Result<String, BackendError>;
}
