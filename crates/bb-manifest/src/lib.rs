//! # bb-manifest
//!
//! Append-only ledger of registered stages, backed by a single SQLite
//! container ("the manifest").
//!
//! Two correlated tables model the one-to-many relationship between a stage
//! and its unique (run, subrun) pairs: `stages` holds one row per
//! [`StageRecord`] keyed by `stage_name`, and `run_subruns` holds one audit
//! row per pair tagged with the owning stage name. A `meta` table records
//! the exposure-database path and POT scale once, first writer wins.
//!
//! Registration is idempotent: re-registering an existing stage name is a
//! logged no-op that reports success, so batch pipelines can safely re-run
//! over the same stage. The existence check happens immediately before the
//! append inside one connection; concurrent registrations of *different*
//! stages in the same manifest are safe (each append is one transaction),
//! while concurrent writers of the *same* stage name must be serialized by
//! the caller.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use bb_core::{
    BeamMode, Error, ExposureSums, Result, RunSubrunPair, SampleKind, ScanResult, StageConfig,
    StageRecord,
};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS stages (
    stage_name TEXT PRIMARY KEY,
    filelist_path TEXT NOT NULL,
    kind TEXT NOT NULL,
    beam TEXT NOT NULL,
    n_input_files INTEGER NOT NULL,
    subrun_pot_sum REAL NOT NULL,
    subrun_entries INTEGER NOT NULL,
    n_unique_pairs INTEGER NOT NULL,
    tortgt_sum REAL NOT NULL,
    tor101_sum REAL NOT NULL,
    tor860_sum REAL NOT NULL,
    tor875_sum REAL NOT NULL,
    ea9cnt_sum INTEGER NOT NULL,
    e1dcnt_sum INTEGER NOT NULL,
    exttrig_sum INTEGER NOT NULL,
    gate1trig_sum INTEGER NOT NULL,
    gate2trig_sum INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS run_subruns (
    stage_name TEXT NOT NULL,
    run INTEGER NOT NULL,
    subrun INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_run_subruns_stage
    ON run_subruns(stage_name);

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// What `register_stage` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The stage was appended to the manifest.
    Registered,
    /// The stage name was already present; nothing was written.
    AlreadyRegistered,
}

/// List the stage names already registered in a manifest.
///
/// A manifest that does not exist yet is an empty registry, not an error;
/// this never creates the file.
pub fn list_stage_names(path: &Path) -> Result<BTreeSet<String>> {
    if !path.exists() {
        return Ok(BTreeSet::new());
    }
    let conn = open_read_only(path)?;
    let mut stmt = conn.prepare("SELECT stage_name FROM stages")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<BTreeSet<_>, _>>()?;
    Ok(names)
}

/// Register a stage, appending it and its unique pairs to the manifest.
///
/// Idempotent on `stage_name`: an existing name short-circuits with
/// [`RegisterOutcome::AlreadyRegistered`] and leaves the manifest untouched.
/// Otherwise the stage row, the per-pair audit rows, and the first-writer
/// metadata are written in one transaction, so the manifest is never left
/// half-written.
pub fn register_stage(
    path: &Path,
    record: &StageRecord,
    db_path: &str,
    pot_scale: f64,
) -> Result<RegisterOutcome> {
    let mut conn = Connection::open(path).map_err(|e| Error::open(path, e))?;
    conn.execute_batch(SCHEMA_SQL)?;

    let exists = conn
        .query_row(
            "SELECT 1 FROM stages WHERE stage_name = ?1",
            params![record.cfg.stage_name],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if exists {
        tracing::info!(
            stage = %record.cfg.stage_name,
            manifest = %path.display(),
            "stage already registered, skipping"
        );
        return Ok(RegisterOutcome::AlreadyRegistered);
    }

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO stages (stage_name, filelist_path, kind, beam, n_input_files,
                             subrun_pot_sum, subrun_entries, n_unique_pairs,
                             tortgt_sum, tor101_sum, tor860_sum, tor875_sum,
                             ea9cnt_sum, e1dcnt_sum, exttrig_sum, gate1trig_sum, gate2trig_sum)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            record.cfg.stage_name,
            record.cfg.filelist_path,
            record.kind.name(),
            record.beam.name(),
            record.n_input_files,
            record.scan.pot_sum,
            record.scan.n_entries,
            record.scan.unique_pairs.len() as u64,
            record.exposure.tortgt_sum,
            record.exposure.tor101_sum,
            record.exposure.tor860_sum,
            record.exposure.tor875_sum,
            record.exposure.ea9cnt_sum,
            record.exposure.e1dcnt_sum,
            record.exposure.exttrig_sum,
            record.exposure.gate1trig_sum,
            record.exposure.gate2trig_sum,
        ],
    )?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO run_subruns (stage_name, run, subrun) VALUES (?1, ?2, ?3)",
        )?;
        for pair in &record.scan.unique_pairs {
            stmt.execute(params![record.cfg.stage_name, pair.run, pair.subrun])?;
        }
    }

    // First writer wins for the global manifest metadata.
    tx.execute(
        "INSERT OR IGNORE INTO meta (key, value) VALUES ('db_path', ?1)",
        params![db_path],
    )?;
    tx.execute(
        "INSERT OR IGNORE INTO meta (key, value) VALUES ('pot_scale', ?1)",
        params![pot_scale.to_string()],
    )?;
    tx.commit()?;

    tracing::info!(
        stage = %record.cfg.stage_name,
        manifest = %path.display(),
        unique_pairs = record.scan.unique_pairs.len(),
        pot_sum = record.scan.pot_sum,
        "stage registered"
    );
    Ok(RegisterOutcome::Registered)
}

/// Read back every registered stage, in registration order.
pub fn read_stages(path: &Path) -> Result<Vec<StageRecord>> {
    let conn = open_read_only(path)?;

    let mut stmt = conn
        .prepare(
            "SELECT stage_name, filelist_path, kind, beam, n_input_files,
                    subrun_pot_sum, subrun_entries,
                    tortgt_sum, tor101_sum, tor860_sum, tor875_sum,
                    ea9cnt_sum, e1dcnt_sum, exttrig_sum, gate1trig_sum, gate2trig_sum
             FROM stages ORDER BY rowid",
        )
        .map_err(|_| Error::missing(path, "stages"))?;

    let mut records = stmt
        .query_map([], |row| {
            Ok(StageRecord {
                cfg: StageConfig {
                    stage_name: row.get(0)?,
                    filelist_path: row.get(1)?,
                },
                kind: SampleKind::parse(&row.get::<_, String>(2)?),
                beam: BeamMode::parse(&row.get::<_, String>(3)?),
                n_input_files: row.get(4)?,
                scan: ScanResult {
                    unique_pairs: BTreeSet::new(),
                    pot_sum: row.get(5)?,
                    n_entries: row.get(6)?,
                },
                exposure: ExposureSums {
                    tortgt_sum: row.get(7)?,
                    tor101_sum: row.get(8)?,
                    tor860_sum: row.get(9)?,
                    tor875_sum: row.get(10)?,
                    ea9cnt_sum: row.get(11)?,
                    e1dcnt_sum: row.get(12)?,
                    exttrig_sum: row.get(13)?,
                    gate1trig_sum: row.get(14)?,
                    gate2trig_sum: row.get(15)?,
                },
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut pair_stmt = conn.prepare(
        "SELECT run, subrun FROM run_subruns WHERE stage_name = ?1 ORDER BY run, subrun",
    )?;
    for record in &mut records {
        let pairs = pair_stmt
            .query_map(params![record.cfg.stage_name], |row| {
                Ok(RunSubrunPair::new(row.get(0)?, row.get(1)?))
            })?
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;
        record.scan.unique_pairs = pairs;
    }

    Ok(records)
}

/// Read the global manifest metadata (`db_path`, `pot_scale`).
pub fn read_meta(path: &Path) -> Result<BTreeMap<String, String>> {
    let conn = open_read_only(path)?;
    let mut stmt = conn
        .prepare("SELECT key, value FROM meta")
        .map_err(|_| Error::missing(path, "meta"))?;
    let meta = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;
    Ok(meta)
}

fn open_read_only(path: &Path) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Connection::open_with_flags(path, flags).map_err(|e| Error::open(path, e))
}
