use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use wellsift_core::{Config, DocumentOutcome, OcrEngine, PdfSource};
use wellsift_store::WellStore;

use crate::IngestError;
use crate::acquire::TextAcquirer;
use crate::coordinator::IngestionCoordinator;

/// One document to process; the outcome comes back on `result_tx`.
/// A dropped sender means the job was never processed (shutdown).
pub struct DocJob {
    pub path: PathBuf,
    pub result_tx: oneshot::Sender<DocumentOutcome>,
}

/// Tally of outcomes over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub stored: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub errored: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &DocumentOutcome) {
        match outcome {
            DocumentOutcome::Stored { .. } => self.stored += 1,
            DocumentOutcome::Skipped => self.skipped += 1,
            DocumentOutcome::Rejected => self.rejected += 1,
            DocumentOutcome::Errored { .. } => self.errored += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.stored + self.skipped + self.rejected + self.errored
    }
}

/// A fixed set of blocking workers fed from a shared channel.
///
/// Each worker holds its own SQLite connection; document-level work (PDF
/// rendering, OCR, parsing) is CPU bound and runs on `spawn_blocking`
/// threads so the async runtime stays responsive for submission and
/// shutdown.
pub struct IngestPool {
    job_tx: async_channel::Sender<DocJob>,
    handles: Vec<JoinHandle<()>>,
}

impl IngestPool {
    pub fn new(
        source: Arc<dyn PdfSource>,
        ocr: Arc<dyn OcrEngine>,
        config: &Config,
        cancel: CancellationToken,
    ) -> Result<Self, IngestError> {
        let (job_tx, job_rx) = async_channel::unbounded::<DocJob>();

        let acquirer = TextAcquirer::new(source, ocr)
            .with_dpi(config.ocr_dpi)
            .with_batch_pages(config.ocr_batch_pages);
        let timeout = Duration::from_secs(config.document_timeout_secs);
        let workers = config.num_workers.max(1);

        // Connections are opened up front so a bad db path fails the run
        // before any document is touched.
        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let store = WellStore::open(&config.db_path)?;
            let coordinator = IngestionCoordinator::new(acquirer.clone());
            let job_rx = job_rx.clone();
            let cancel = cancel.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                worker_loop(worker_id, job_rx, coordinator, store, cancel, timeout);
            }));
        }

        info!(workers, "ingest pool started");
        Ok(Self { job_tx, handles })
    }

    /// Queue a document. The receiver resolves to its outcome, or errors
    /// if the pool shut down before the job was picked up.
    pub async fn submit(
        &self,
        path: PathBuf,
    ) -> Result<oneshot::Receiver<DocumentOutcome>, IngestError> {
        let (result_tx, result_rx) = oneshot::channel();
        self.job_tx
            .send(DocJob { path, result_tx })
            .await
            .map_err(|_| IngestError::PoolClosed)?;
        Ok(result_rx)
    }

    /// Close the queue and wait for workers to drain it.
    pub async fn shutdown(self) {
        self.job_tx.close();
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

fn worker_loop(
    worker_id: usize,
    job_rx: async_channel::Receiver<DocJob>,
    coordinator: IngestionCoordinator,
    mut store: WellStore,
    cancel: CancellationToken,
    timeout: Duration,
) {
    while let Ok(job) = job_rx.recv_blocking() {
        if cancel.is_cancelled() {
            // Drop the job; the unresolved oneshot tells the submitter.
            continue;
        }
        let deadline = Instant::now() + timeout;
        let outcome = coordinator.ingest(&job.path, &mut store, &cancel, Some(deadline));
        let _ = job.result_tx.send(outcome);
    }
    debug!(worker = worker_id, "worker exiting");
}

/// All `.pdf` files directly under `dir`, sorted by name so runs are
/// deterministic.
pub fn list_pdfs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = path.extension()
            && ext.to_string_lossy().eq_ignore_ascii_case("pdf")
        {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    fn temp_dir() -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let dir = std::env::temp_dir().join(format!(
            "wellsift-pool-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn list_pdfs_filters_and_sorts() {
        let dir = temp_dir();
        for name in ["b.pdf", "a.PDF", "notes.txt", "c.pdf.bak"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.join("nested.pdf")).unwrap();

        let found = list_pdfs(&dir).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn summary_tallies_outcomes() {
        let mut summary = RunSummary::default();
        summary.record(&DocumentOutcome::Stored {
            well_id: 1,
            stimulations: 2,
        });
        summary.record(&DocumentOutcome::Skipped);
        summary.record(&DocumentOutcome::Rejected);
        summary.record(&DocumentOutcome::Errored {
            message: "boom".into(),
        });
        summary.record(&DocumentOutcome::Skipped);
        assert_eq!(
            summary,
            RunSummary {
                stored: 1,
                skipped: 2,
                rejected: 1,
                errored: 1,
            }
        );
        assert_eq!(summary.total(), 5);
    }
}
