//! Sample persistence in a self-describing SQLite container.
//!
//! One `sample` table holds the scalar fields as a single row; a
//! `fragments` table carries the constituent fragments with an explicit
//! `ord` column so read-back preserves aggregation order. REAL columns are
//! IEEE-754 doubles, so every f64 round-trips exactly.

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use bb_core::{BeamMode, Error, Result, SampleKind};

use crate::types::{Sample, SampleFragment};

const SCHEMA_SQL: &str = "
CREATE TABLE sample (
    sample_name TEXT NOT NULL,
    kind TEXT NOT NULL,
    beam TEXT NOT NULL,
    subrun_pot_sum REAL NOT NULL,
    db_tortgt_pot_sum REAL NOT NULL,
    db_tor101_pot_sum REAL NOT NULL,
    normalization REAL NOT NULL,
    normalized_pot_sum REAL NOT NULL
);

CREATE TABLE fragments (
    ord INTEGER PRIMARY KEY,
    fragment_name TEXT NOT NULL,
    source_path TEXT NOT NULL,
    subrun_pot_sum REAL NOT NULL,
    db_tortgt_pot REAL NOT NULL,
    db_tor101_pot REAL NOT NULL,
    normalization REAL NOT NULL,
    normalized_pot_sum REAL NOT NULL
);
";

/// Write a sample to `path`, replacing any previously persisted sample.
///
/// The drop-and-recreate of both tables happens inside one transaction, so
/// a failed write leaves the prior contents untouched.
pub fn write_sample(sample: &Sample, path: &Path) -> Result<()> {
    let mut conn = Connection::open(path).map_err(|e| Error::open(path, e))?;

    let tx = conn.transaction()?;
    tx.execute_batch("DROP TABLE IF EXISTS sample; DROP TABLE IF EXISTS fragments;")?;
    tx.execute_batch(SCHEMA_SQL)?;

    tx.execute(
        "INSERT INTO sample (sample_name, kind, beam, subrun_pot_sum,
                             db_tortgt_pot_sum, db_tor101_pot_sum,
                             normalization, normalized_pot_sum)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            sample.sample_name,
            sample.kind.name(),
            sample.beam.name(),
            sample.subrun_pot_sum,
            sample.db_tortgt_pot_sum,
            sample.db_tor101_pot_sum,
            sample.normalization,
            sample.normalized_pot_sum,
        ],
    )?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO fragments (ord, fragment_name, source_path, subrun_pot_sum,
                                    db_tortgt_pot, db_tor101_pot,
                                    normalization, normalized_pot_sum)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for (ord, fragment) in sample.fragments.iter().enumerate() {
            stmt.execute(params![
                ord as i64,
                fragment.fragment_name,
                fragment.source_path,
                fragment.subrun_pot_sum,
                fragment.db_tortgt_pot,
                fragment.db_tor101_pot,
                fragment.normalization,
                fragment.normalized_pot_sum,
            ])?;
        }
    }
    tx.commit()?;

    tracing::info!(
        sample = %sample.sample_name,
        fragments = sample.fragments.len(),
        path = %path.display(),
        "sample written"
    );
    Ok(())
}

/// Read a sample back from `path`.
///
/// A missing file, table, or row is fatal and names the offending path and
/// field.
pub fn read_sample(path: &Path) -> Result<Sample> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags).map_err(|e| Error::open(path, e))?;

    let mut stmt = conn
        .prepare(
            "SELECT sample_name, kind, beam, subrun_pot_sum, db_tortgt_pot_sum,
                    db_tor101_pot_sum, normalization, normalized_pot_sum
             FROM sample",
        )
        .map_err(|_| Error::missing(path, "sample"))?;

    let mut out = stmt
        .query_row([], |row| {
            Ok(Sample {
                sample_name: row.get(0)?,
                kind: SampleKind::parse(&row.get::<_, String>(1)?),
                beam: BeamMode::parse(&row.get::<_, String>(2)?),
                fragments: Vec::new(),
                subrun_pot_sum: row.get(3)?,
                db_tortgt_pot_sum: row.get(4)?,
                db_tor101_pot_sum: row.get(5)?,
                normalization: row.get(6)?,
                normalized_pot_sum: row.get(7)?,
            })
        })
        .optional()?
        .ok_or_else(|| Error::missing(path, "sample"))?;

    let mut stmt = conn
        .prepare(
            "SELECT fragment_name, source_path, subrun_pot_sum, db_tortgt_pot,
                    db_tor101_pot, normalization, normalized_pot_sum
             FROM fragments ORDER BY ord",
        )
        .map_err(|_| Error::missing(path, "fragments"))?;

    out.fragments = stmt
        .query_map([], |row| {
            Ok(SampleFragment {
                fragment_name: row.get(0)?,
                source_path: row.get(1)?,
                subrun_pot_sum: row.get(2)?,
                db_tortgt_pot: row.get(3)?,
                db_tor101_pot: row.get(4)?,
                normalization: row.get(5)?,
                normalized_pot_sum: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(out)
}
