//! End-to-end pipeline test: a directory of documents goes through the
//! worker pool into SQLite, with dedup on re-run and rejection of
//! documents carrying no API number.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio_util::sync::CancellationToken;

use wellsift_core::{BackendError, Config, DocumentOutcome, OcrEngine, PdfSource};
use wellsift_ingest::{IngestPool, RunSummary, list_pdfs};
use wellsift_store::WellStore;

/// Direct-text source keyed by filename. Reports zero pages so documents
/// that fail the direct-text gate fall through without OCR.
struct FixtureSource {
    texts: HashMap<String, String>,
}

impl PdfSource for FixtureSource {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.texts
            .get(&name)
            .cloned()
            .ok_or_else(|| BackendError::Open(format!("unknown fixture {name}")))
    }

    fn page_count(&self, _path: &Path) -> Result<usize, BackendError> {
        Ok(0)
    }

    fn render_page_png(
        &self,
        _path: &Path,
        _page_index: usize,
        _dpi: u32,
    ) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Render("fixtures have no pages".into()))
    }
}

struct NoOcr;

impl OcrEngine for NoOcr {
    fn recognize_png(&self, _png: &[u8]) -> Result<String, BackendError> {
        Err(BackendError::Ocr("OCR not expected in this test".into()))
    }
}

fn temp_dir(tag: &str) -> PathBuf {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let dir = std::env::temp_dir().join(format!(
        "wellsift-it-{tag}-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn report_text(api_suffix: &str, well_name: &str) -> String {
    let mut text = format!(
        "WELL COMPLETION REPORT\n\
         API # 33-025-{api_suffix}\n\
         Well Name and Number: {well_name}\n\
         Operator: Meadowlark Energy LLC\n\
         Address: 120 Main Street, Bismarck, ND 58501\n\
         County: McKenzie\n\
         State: North Dakota\n\
         Latitude: 47 30' 00\" N\n\
         Longitude: 103 15' 00\" W\n\
         Well Specific Stimulations\n\
         Date Stimulated Stimulated Formation Top (Ft) Bottom (Ft) Stages Volume Units\n\
         6/15/2019 Bakken 9800 19500 38 65,000 Barrels\n\
         Type Treatment: Sand Frac\n\
         Lbs Proppant: 4,500,000\n"
    );
    for _ in 0..20 {
        text.push_str("Pursuant to commission rules this completion is reported in full.\n");
    }
    text
}

fn no_api_text() -> String {
    let mut text = String::from("COVER LETTER\nRe: enclosed documents for your records\n");
    for _ in 0..20 {
        text.push_str("Please find attached the requested correspondence and exhibits.\n");
    }
    text
}

struct Fixture {
    pdf_dir: PathBuf,
    config: Config,
    source: Arc<FixtureSource>,
}

fn build_fixture() -> Fixture {
    let pdf_dir = temp_dir("pdfs");
    let db_dir = temp_dir("db");

    let mut texts = HashMap::new();
    texts.insert(
        "w1.pdf".to_string(),
        report_text("01111", "BLUE PRAIRIE 12-34H"),
    );
    texts.insert(
        "w2.pdf".to_string(),
        report_text("02222", "SAGE GROUSE 5-17H"),
    );
    texts.insert(
        "w3.pdf".to_string(),
        report_text("03333", "ANTELOPE FLATS 9-2H"),
    );
    texts.insert("cover.pdf".to_string(), no_api_text());

    // File bytes mirror the fixture text so each document hashes uniquely.
    for (name, text) in &texts {
        std::fs::write(pdf_dir.join(name), text.as_bytes()).unwrap();
    }

    let config = Config {
        db_path: db_dir.join("wells.db"),
        pdf_dir: pdf_dir.clone(),
        num_workers: 2,
        ..Config::default()
    };
    Fixture {
        pdf_dir,
        config,
        source: Arc::new(FixtureSource { texts }),
    }
}

async fn run_once(fixture: &Fixture) -> RunSummary {
    let pool = IngestPool::new(
        fixture.source.clone(),
        Arc::new(NoOcr),
        &fixture.config,
        CancellationToken::new(),
    )
    .unwrap();

    let mut receivers = Vec::new();
    for path in list_pdfs(&fixture.pdf_dir).unwrap() {
        receivers.push(pool.submit(path).await.unwrap());
    }

    let mut summary = RunSummary::default();
    for rx in receivers {
        summary.record(&rx.await.unwrap());
    }
    pool.shutdown().await;
    summary
}

#[tokio::test(flavor = "multi_thread")]
async fn directory_run_stores_then_dedups() {
    let fixture = build_fixture();

    let first = run_once(&fixture).await;
    assert_eq!(
        first,
        RunSummary {
            stored: 3,
            skipped: 0,
            rejected: 1,
            errored: 0,
        }
    );

    // Same bytes again: stored wells dedup by content hash, the rejected
    // cover letter was never persisted so it is rejected again.
    let second = run_once(&fixture).await;
    assert_eq!(
        second,
        RunSummary {
            stored: 0,
            skipped: 3,
            rejected: 1,
            errored: 0,
        }
    );

    let store = WellStore::open(&fixture.config.db_path).unwrap();
    let wells = store.list_wells().unwrap();
    assert_eq!(wells.len(), 3);

    let blue = wells
        .iter()
        .find(|w| w.well_name.as_deref() == Some("BLUE PRAIRIE 12-34H"))
        .unwrap();
    assert_eq!(blue.api, "33-025-01111");
    assert_eq!(blue.qc_status, "valid");
    assert_eq!(blue.county.as_deref(), Some("McKenzie"));
    assert_eq!(blue.state.as_deref(), Some("North Dakota"));
    assert!((blue.latitude.unwrap() - 47.5).abs() < 1e-9);
    assert!((blue.longitude.unwrap() + 103.25).abs() < 1e-9);
    assert_eq!(blue.stimulations.len(), 1);
    let stim = &blue.stimulations[0];
    assert_eq!(stim.stimulated_formation.as_deref(), Some("Bakken"));
    assert_eq!(stim.stages, Some(38));
    assert_eq!(stim.treatment_type.as_deref(), Some("Sand Frac"));
    assert_eq!(stim.lbs_proppant, Some(4_500_000.0));
    // Listing omits raw text; the by-id lookup carries it.
    assert!(blue.raw_text.is_none());
    let full = store.get_well(blue.id).unwrap().unwrap();
    assert!(full.raw_text.unwrap().contains("BLUE PRAIRIE"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unreadable_file_is_errored_not_fatal() {
    let fixture = build_fixture();

    let pool = IngestPool::new(
        fixture.source.clone(),
        Arc::new(NoOcr),
        &fixture.config,
        CancellationToken::new(),
    )
    .unwrap();

    // A path that does not exist on disk cannot be hashed.
    let rx = pool
        .submit(fixture.pdf_dir.join("vanished.pdf"))
        .await
        .unwrap();
    let outcome = rx.await.unwrap();
    assert!(matches!(outcome, DocumentOutcome::Errored { .. }));

    // The pool keeps serving after the error.
    let rx = pool.submit(fixture.pdf_dir.join("w1.pdf")).await.unwrap();
    assert!(matches!(
        rx.await.unwrap(),
        DocumentOutcome::Stored { stimulations: 1, .. }
    ));
    pool.shutdown().await;
}
