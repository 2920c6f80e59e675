//! # bb-beamdb
//!
//! Read-only access to the authoritative beam-exposure database.
//!
//! The store keeps one row per (run, subrun) in a `runinfo` table: four
//! toroid POT counters (in units of 1e12 protons) and five trigger/gate
//! device counts. [`BeamDb::sum_exposure`] reconciles a scan's unique pair
//! set against it in a single pass; pairs without coverage contribute zero.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use bb_core::{Error, ExposureSums, Result, RunSubrunPair};

/// Raw toroid units in the store are 1e12 protons.
pub const DEFAULT_POT_SCALE: f64 = 1e12;

const SUM_SQL: &str = "SELECT tortgt, tor101, tor860, tor875, \
                       ea9cnt, e1dcnt, exttrig, gate1trig, gate2trig \
                       FROM runinfo WHERE run = ?1 AND subrun = ?2";

/// An open beam-exposure database connection.
///
/// The connection is closed when the value drops, on all exit paths.
pub struct BeamDb {
    conn: Connection,
    path: PathBuf,
}

impl BeamDb {
    /// Open the database read-only. Failure to open is fatal; a missing
    /// row later is not.
    pub fn open(path: &Path) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| Error::open(path, e))?;
        Ok(Self { conn, path: path.to_path_buf() })
    }

    /// Path this database was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sum the nine exposure counters over a set of unique pairs.
    ///
    /// One prepared statement, one lookup per pair. Pairs absent from the
    /// store contribute zero; toroid sums are scaled by `pot_scale` to
    /// convert raw store units into protons.
    pub fn sum_exposure(
        &self,
        pairs: &BTreeSet<RunSubrunPair>,
        pot_scale: f64,
    ) -> Result<ExposureSums> {
        let mut stmt = self.conn.prepare(SUM_SQL)?;

        let mut sums = ExposureSums::default();
        let mut n_missing: u64 = 0;

        for pair in pairs {
            let row = stmt
                .query_row(params![pair.run, pair.subrun], |row| {
                    Ok((
                        row.get::<_, f64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, i64>(7)?,
                        row.get::<_, i64>(8)?,
                    ))
                })
                .optional()?;

            match row {
                Some((tortgt, tor101, tor860, tor875, ea9, e1d, ext, g1, g2)) => {
                    sums.tortgt_sum += tortgt * pot_scale;
                    sums.tor101_sum += tor101 * pot_scale;
                    sums.tor860_sum += tor860 * pot_scale;
                    sums.tor875_sum += tor875 * pot_scale;
                    sums.ea9cnt_sum += ea9;
                    sums.e1dcnt_sum += e1d;
                    sums.exttrig_sum += ext;
                    sums.gate1trig_sum += g1;
                    sums.gate2trig_sum += g2;
                }
                None => n_missing += 1,
            }
        }

        tracing::info!(
            db = %self.path.display(),
            pairs = pairs.len(),
            missing = n_missing,
            tortgt_sum = sums.tortgt_sum,
            "exposure reconciliation complete"
        );
        Ok(sums)
    }
}
