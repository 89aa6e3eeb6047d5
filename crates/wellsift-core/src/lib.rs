use std::path::PathBuf;

use chrono::NaiveDate;

pub mod backend;
pub mod batch;
pub mod config_file;
pub mod geo;
pub mod qc;

// Re-export for convenience
pub use backend::{BackendError, OcrEngine, PdfSource};
pub use batch::OcrBatchPolicy;
pub use geo::{dms_to_decimal, within_north_dakota};
pub use qc::{QcInput, QcStatus, classify};

/// How the text of a document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMethod {
    /// The PDF carried a usable native text layer.
    Direct,
    /// Pages were rasterized and recognized.
    Ocr,
}

impl AcquisitionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcquisitionMethod::Direct => "direct",
            AcquisitionMethod::Ocr => "ocr",
        }
    }
}

/// A structured well record extracted from one completion report.
///
/// `api` is the natural key for upserts: a corrected re-scan of the same
/// well updates the same logical row. `file_hash` identifies the source
/// bytes and is globally unique across stored documents.
#[derive(Debug, Clone, Default)]
pub struct WellRecord {
    pub filename: String,
    pub file_hash: String,
    pub api: Option<String>,
    pub well_name: Option<String>,
    pub well_number: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub operator: Option<String>,
    pub qc_status: QcStatus,
    pub raw_text: String,
}

/// One stimulation treatment row, as persisted.
///
/// Tabular fields come from the stimulation table; the extended fields
/// (treatment type, proppant, pressure, rate) are document-level and are
/// merged onto every row of the same well.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StimulationRecord {
    pub date_stimulated: Option<NaiveDate>,
    pub stimulated_formation: Option<String>,
    pub top_ft: Option<f64>,
    pub bottom_ft: Option<f64>,
    pub stages: Option<u32>,
    pub volume: Option<f64>,
    pub volume_units: Option<String>,
    pub treatment_type: Option<String>,
    pub lbs_proppant: Option<f64>,
    pub acid_percent: Option<f64>,
    pub treatment_pressure: Option<f64>,
    pub max_treatment_rate: Option<f64>,
    pub additional_info: Option<String>,
}

/// Terminal outcome of ingesting a single document.
///
/// A run tallies these; no outcome aborts the run.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    /// Content hash already stored; nothing was done.
    Skipped,
    /// QC classified the record invalid; nothing was persisted.
    Rejected,
    /// Persisted (inserted or updated) under this row id.
    Stored { well_id: i64, stimulations: usize },
    /// The document failed; the run continues.
    Errored { message: String },
}

/// Runtime configuration for an ingestion run.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub pdf_dir: PathBuf,
    /// Raster resolution for OCR page rendering.
    pub ocr_dpi: u32,
    /// Initial OCR batch size in pages.
    pub ocr_batch_pages: usize,
    pub num_workers: usize,
    /// Per-document wall-clock budget; OCR stops between batches when hit.
    pub document_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("wells.db"),
            pdf_dir: PathBuf::from("pdfs"),
            ocr_dpi: 225,
            ocr_batch_pages: OcrBatchPolicy::DEFAULT_PAGES,
            num_workers: 4,
            document_timeout_secs: 600,
        }
    }
}
