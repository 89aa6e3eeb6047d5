use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Instant;

use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use wellsift_core::{DocumentOutcome, QcInput, QcStatus, WellRecord, classify};
use wellsift_parsing::{
    extract_coordinates, extract_well_fields, merge_stimulations, parse_stimulations,
};
use wellsift_store::WellStore;

use crate::acquire::TextAcquirer;

/// Wells without a state field are assumed local; the pipeline only
/// processes North Dakota completion reports.
const DEFAULT_STATE: &str = "North Dakota";

/// SHA-256 of the file at `path`, hex encoded.
pub fn file_sha256(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Runs one document through the full pipeline: dedup, acquisition,
/// extraction, QC, and persistence. Every failure becomes an outcome;
/// nothing here aborts the surrounding run.
#[derive(Clone)]
pub struct IngestionCoordinator {
    acquirer: TextAcquirer,
}

impl IngestionCoordinator {
    pub fn new(acquirer: TextAcquirer) -> Self {
        Self { acquirer }
    }

    pub fn ingest(
        &self,
        path: &Path,
        store: &mut WellStore,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> DocumentOutcome {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let file_hash = match file_sha256(path) {
            Ok(hash) => hash,
            Err(err) => {
                warn!(file = %filename, error = %err, "could not hash file");
                return DocumentOutcome::Errored {
                    message: format!("hashing failed: {err}"),
                };
            }
        };

        match store.contains_hash(&file_hash) {
            Ok(true) => {
                debug!(file = %filename, "already ingested, skipping");
                return DocumentOutcome::Skipped;
            }
            Ok(false) => {}
            Err(err) => {
                warn!(file = %filename, error = %err, "dedup lookup failed");
                return DocumentOutcome::Errored {
                    message: format!("dedup lookup failed: {err}"),
                };
            }
        }

        let acquired = self.acquirer.acquire(path, cancel, deadline);
        debug!(
            file = %filename,
            method = acquired.method.as_str(),
            chars = acquired.text.len(),
            "text acquired"
        );

        let fields = extract_well_fields(&acquired.text);
        let coordinates = extract_coordinates(&acquired.text);
        let (rows, extended) = parse_stimulations(&acquired.text);

        let qc_status = classify(&QcInput {
            api: fields.api.as_deref(),
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lon)| lon),
            well_name: fields.well_name.as_deref(),
        });
        if qc_status == QcStatus::Invalid {
            info!(file = %filename, "rejected: no API number found");
            return DocumentOutcome::Rejected;
        }

        let record = WellRecord {
            filename,
            file_hash,
            api: fields.api,
            well_name: fields.well_name,
            well_number: fields.well_number,
            address: fields.address,
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lon)| lon),
            county: fields.county,
            state: fields.state.or_else(|| Some(DEFAULT_STATE.to_string())),
            operator: fields.operator,
            qc_status,
            raw_text: acquired.text,
        };
        let stimulations = merge_stimulations(rows, &extended);

        match store.store_document(&record, &stimulations) {
            Ok(stored) => {
                info!(
                    file = %record.filename,
                    well_id = stored.well_id,
                    stimulations = stored.stimulations,
                    qc = record.qc_status.as_str(),
                    "stored"
                );
                DocumentOutcome::Stored {
                    well_id: stored.well_id,
                    stimulations: stored.stimulations,
                }
            }
            Err(err) => {
                warn!(file = %record.filename, error = %err, "persistence failed");
                DocumentOutcome::Errored {
                    message: format!("persistence failed: {err}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn temp_file(contents: &[u8]) -> std::path::PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let path = std::env::temp_dir().join(format!(
            "wellsift-hash-{}-{}.bin",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn sha256_is_stable_and_content_sensitive() {
        let a = temp_file(b"completion report one");
        let b = temp_file(b"completion report one");
        let c = temp_file(b"completion report two");

        let hash_a = file_sha256(&a).unwrap();
        let hash_b = file_sha256(&b).unwrap();
        let hash_c = file_sha256(&c).unwrap();

        assert_eq!(hash_a.len(), 64);
        assert!(hash_a.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_eq!(hash_a, hash_b);
        assert_ne!(hash_a, hash_c);

        for path in [a, b, c] {
            let _ = std::fs::remove_file(path);
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        let missing = std::env::temp_dir().join("wellsift-hash-definitely-missing.pdf");
        assert!(file_sha256(&missing).is_err());
    }
}
