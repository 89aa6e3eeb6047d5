//! SQLite persistence for well and stimulation records.
//!
//! One `WellStore` wraps one connection; the worker pool opens one store
//! per worker. Each document is written in a single transaction: the well
//! row is upserted by API number (returning the row id atomically via
//! `RETURNING`), and that well's stimulation rows are replaced wholesale
//! so re-ingestion of a corrected file never duplicates them.

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OpenFlags, params};
use serde::Serialize;
use thiserror::Error;

use wellsift_core::{QcStatus, StimulationRecord, WellRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("record has no API number")]
    MissingApi,
}

/// Result of a successful per-document write.
#[derive(Debug, Clone, Copy)]
pub struct StoredWell {
    pub well_id: i64,
    pub stimulations: usize,
}

/// A well row with its stimulation rows, as served by the read API.
#[derive(Debug, Clone, Serialize)]
pub struct WellRow {
    pub id: i64,
    pub filename: Option<String>,
    pub api: String,
    pub well_name: Option<String>,
    pub well_number: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub operator: Option<String>,
    pub qc_status: String,
    pub created_at: String,
    /// Raw document text; only populated on by-id lookups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    pub stimulations: Vec<StimulationRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StimulationRow {
    pub id: i64,
    pub date_stimulated: Option<String>,
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

/// Per-status record counts, for run summaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusCounts {
    pub valid: usize,
    pub needs_review: usize,
    pub invalid: usize,
}

pub struct WellStore {
    conn: Connection,
}

impl WellStore {
    /// Open (creating if needed) the database at `path` with WAL mode and
    /// standard pragmas, and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            let _ = std::fs::create_dir_all(parent);
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "busy_timeout", 5000)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS wells (
                 id          INTEGER PRIMARY KEY,
                 filename    TEXT,
                 file_hash   TEXT NOT NULL UNIQUE,
                 api         TEXT NOT NULL UNIQUE,
                 well_name   TEXT,
                 well_number TEXT,
                 address     TEXT,
                 latitude    REAL,
                 longitude   REAL,
                 county      TEXT,
                 state       TEXT,
                 operator    TEXT,
                 qc_status   TEXT NOT NULL,
                 raw_text    TEXT,
                 created_at  TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS stimulations (
                 id                    INTEGER PRIMARY KEY,
                 well_id               INTEGER NOT NULL
                                       REFERENCES wells(id) ON DELETE CASCADE,
                 date_stimulated       TEXT,
                 stimulated_formation  TEXT,
                 top_ft                REAL,
                 bottom_ft             REAL,
                 stages                INTEGER,
                 volume                REAL,
                 volume_units          TEXT,
                 treatment_type        TEXT,
                 lbs_proppant          REAL,
                 acid_percent          REAL,
                 treatment_pressure    REAL,
                 max_treatment_rate    REAL,
                 additional_info       TEXT
             );
             CREATE INDEX IF NOT EXISTS idx_stimulations_well_id
                 ON stimulations(well_id);",
        )
    }

    /// Whether a document with this content hash is already stored.
    pub fn contains_hash(&self, file_hash: &str) -> Result<bool, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM wells WHERE file_hash = ?1 LIMIT 1")?;
        Ok(stmt.exists(params![file_hash])?)
    }

    /// Persist one document: upsert the well by API number and replace its
    /// stimulation rows. All or nothing.
    pub fn store_document(
        &mut self,
        well: &WellRecord,
        stimulations: &[StimulationRecord],
    ) -> Result<StoredWell, StoreError> {
        let api = well.api.as_deref().ok_or(StoreError::MissingApi)?;
        let created_at = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;

        let well_id: i64 = {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO wells (
                     filename, file_hash, api, well_name, well_number, address,
                     latitude, longitude, county, state, operator,
                     qc_status, raw_text, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(api) DO UPDATE SET
                     filename  = excluded.filename,
                     file_hash = excluded.file_hash,
                     address   = excluded.address,
                     latitude  = excluded.latitude,
                     longitude = excluded.longitude,
                     qc_status = excluded.qc_status,
                     raw_text  = excluded.raw_text
                 RETURNING id",
            )?;
            stmt.query_row(
                params![
                    well.filename,
                    well.file_hash,
                    api,
                    well.well_name,
                    well.well_number,
                    well.address,
                    well.latitude,
                    well.longitude,
                    well.county,
                    well.state,
                    well.operator,
                    well.qc_status.as_str(),
                    well.raw_text,
                    created_at,
                ],
                |row| row.get(0),
            )?
        };

        {
            let mut delete = tx.prepare_cached("DELETE FROM stimulations WHERE well_id = ?1")?;
            delete.execute(params![well_id])?;

            let mut insert = tx.prepare_cached(
                "INSERT INTO stimulations (
                     well_id, date_stimulated, stimulated_formation, top_ft,
                     bottom_ft, stages, volume, volume_units, treatment_type,
                     lbs_proppant, acid_percent, treatment_pressure,
                     max_treatment_rate, additional_info
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )?;
            for stim in stimulations {
                insert.execute(params![
                    well_id,
                    stim.date_stimulated.map(|d| d.to_string()),
                    stim.stimulated_formation,
                    stim.top_ft,
                    stim.bottom_ft,
                    stim.stages,
                    stim.volume,
                    stim.volume_units,
                    stim.treatment_type,
                    stim.lbs_proppant,
                    stim.acid_percent,
                    stim.treatment_pressure,
                    stim.max_treatment_rate,
                    stim.additional_info,
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(
            api,
            well_id,
            stimulations = stimulations.len(),
            "document stored"
        );
        Ok(StoredWell {
            well_id,
            stimulations: stimulations.len(),
        })
    }

    /// All wells with their stimulation rows. Raw text is omitted.
    pub fn list_wells(&self) -> Result<Vec<WellRow>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, filename, api, well_name, well_number, address,
                    latitude, longitude, county, state, operator, qc_status,
                    created_at
             FROM wells ORDER BY id",
        )?;
        let mut wells: Vec<WellRow> = stmt
            .query_map([], |row| {
                Ok(WellRow {
                    id: row.get(0)?,
                    filename: row.get(1)?,
                    api: row.get(2)?,
                    well_name: row.get(3)?,
                    well_number: row.get(4)?,
                    address: row.get(5)?,
                    latitude: row.get(6)?,
                    longitude: row.get(7)?,
                    county: row.get(8)?,
                    state: row.get(9)?,
                    operator: row.get(10)?,
                    qc_status: row.get(11)?,
                    created_at: row.get(12)?,
                    raw_text: None,
                    stimulations: Vec::new(),
                })
            })?
            .collect::<Result<_, _>>()?;

        for well in &mut wells {
            well.stimulations = self.stimulations_for(well.id)?;
        }
        Ok(wells)
    }

    /// One well by row id, including raw text, or `None`.
    pub fn get_well(&self, id: i64) -> Result<Option<WellRow>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, filename, api, well_name, well_number, address,
                    latitude, longitude, county, state, operator, qc_status,
                    created_at, raw_text
             FROM wells WHERE id = ?1",
        )?;
        let well = stmt
            .query_map(params![id], |row| {
                Ok(WellRow {
                    id: row.get(0)?,
                    filename: row.get(1)?,
                    api: row.get(2)?,
                    well_name: row.get(3)?,
                    well_number: row.get(4)?,
                    address: row.get(5)?,
                    latitude: row.get(6)?,
                    longitude: row.get(7)?,
                    county: row.get(8)?,
                    state: row.get(9)?,
                    operator: row.get(10)?,
                    qc_status: row.get(11)?,
                    created_at: row.get(12)?,
                    raw_text: row.get(13)?,
                    stimulations: Vec::new(),
                })
            })?
            .next()
            .transpose()?;

        match well {
            Some(mut well) => {
                well.stimulations = self.stimulations_for(well.id)?;
                Ok(Some(well))
            }
            None => Ok(None),
        }
    }

    fn stimulations_for(&self, well_id: i64) -> Result<Vec<StimulationRow>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, date_stimulated, stimulated_formation, top_ft,
                    bottom_ft, stages, volume, volume_units, treatment_type,
                    lbs_proppant, acid_percent, treatment_pressure,
                    max_treatment_rate, additional_info
             FROM stimulations WHERE well_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![well_id], |row| {
                Ok(StimulationRow {
                    id: row.get(0)?,
                    date_stimulated: row.get(1)?,
                    stimulated_formation: row.get(2)?,
                    top_ft: row.get(3)?,
                    bottom_ft: row.get(4)?,
                    stages: row.get(5)?,
                    volume: row.get(6)?,
                    volume_units: row.get(7)?,
                    treatment_type: row.get(8)?,
                    lbs_proppant: row.get(9)?,
                    acid_percent: row.get(10)?,
                    treatment_pressure: row.get(11)?,
                    max_treatment_rate: row.get(12)?,
                    additional_info: row.get(13)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(rows)
    }

    /// Record counts grouped by QC status.
    pub fn status_counts(&self) -> Result<StatusCounts, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT qc_status, COUNT(*) FROM wells GROUP BY qc_status")?;
        let mut counts = StatusCounts::default();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, usize>(1)?))
        })?;
        for row in rows {
            let (status, count) = row?;
            match QcStatus::parse(&status) {
                Some(QcStatus::Valid) => counts.valid = count,
                Some(QcStatus::NeedsReview) => counts.needs_review = count,
                Some(QcStatus::Invalid) => counts.invalid = count,
                None => {}
            }
        }
        Ok(counts)
    }
}
