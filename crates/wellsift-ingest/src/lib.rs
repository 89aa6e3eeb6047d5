//! Ingestion pipeline: text acquisition, per-document coordination, and the
//! worker pool that drives a directory of completion reports into the store.

mod acquire;
mod coordinator;
mod pool;

pub use acquire::{AcquiredText, TextAcquirer};
pub use coordinator::{file_sha256, IngestionCoordinator};
pub use pool::{list_pdfs, DocJob, IngestPool, RunSummary};

use std::sync::Arc;

use thiserror::Error;

use wellsift_core::{OcrEngine, PdfSource};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("store error: {0}")]
    Store(#[from] wellsift_store::StoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("worker pool is shut down")]
    PoolClosed,
}

/// Construct the production backends. Behind the `pdf` feature so that the
/// parsing and storage layers can be built without the MuPDF and Tesseract
/// system libraries.
#[cfg(feature = "pdf")]
pub fn default_backends() -> (Arc<dyn PdfSource>, Arc<dyn OcrEngine>) {
    (
        Arc::new(wellsift_pdf_mupdf::MupdfSource::new()),
        Arc::new(wellsift_ocr_tesseract::TesseractEngine::new()),
    )
}
