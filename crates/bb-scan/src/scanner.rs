//! Run/subrun deduplication and first-observation POT summing.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::PathBuf;

use bb_core::{Error, Result, RunSubrunPair, ScanResult};

use crate::columns::{read_batches, try_f64_column, try_i64_column};

/// Column names expected in the per-event metadata table.
const RUN_COL: &str = "run";
const SUBRUN_COL: &str = "subrun";
const POT_COL: &str = "pot";

/// Relative tolerance for flagging inconsistent duplicate POT values.
const POT_MISMATCH_RTOL: f64 = 1e-9;

/// Scan one or more Parquet files for (run, subrun) pairs and inline POT.
///
/// The same subrun appears in many event rows, but its POT value is a
/// subrun-level constant: the first observation of a pair contributes its
/// POT to `pot_sum`, later duplicates are skipped. A later duplicate whose
/// POT disagrees with the first-observed value is logged and ignored.
///
/// Files whose schema lacks `run`/`subrun` columns, or that contain zero
/// rows, contribute nothing and are not an error. A file that cannot be
/// opened at all fails the whole scan.
pub fn scan_subruns(paths: &[PathBuf]) -> Result<ScanResult> {
    if paths.is_empty() {
        return Err(Error::Input("subrun scan requires at least one input file".into()));
    }

    // First-observed POT keyed by pair; BTreeMap keeps canonical ordering.
    let mut first_pot: BTreeMap<RunSubrunPair, f64> = BTreeMap::new();
    let mut n_entries: u64 = 0;

    for path in paths {
        let batches = read_batches(path)?;
        let mut file_rows: u64 = 0;

        for batch in &batches {
            let (Some(runs), Some(subruns)) =
                (try_i64_column(batch, RUN_COL)?, try_i64_column(batch, SUBRUN_COL)?)
            else {
                tracing::debug!(path = %path.display(), "no run/subrun columns, skipping file");
                file_rows = 0;
                break;
            };
            let pots = try_f64_column(batch, POT_COL)?;

            for (i, (&run, &subrun)) in runs.iter().zip(subruns.iter()).enumerate() {
                let pair = RunSubrunPair::new(run, subrun);
                let pot = pots.as_ref().map_or(0.0, |p| p[i]);
                match first_pot.entry(pair) {
                    Entry::Vacant(entry) => {
                        entry.insert(pot);
                    }
                    Entry::Occupied(entry) => {
                        let seen = *entry.get();
                        let scale = seen.abs().max(pot.abs());
                        if (pot - seen).abs() > POT_MISMATCH_RTOL * scale {
                            tracing::warn!(
                                pair = %pair,
                                first = seen,
                                duplicate = pot,
                                path = %path.display(),
                                "duplicate subrun row disagrees on POT, keeping first value"
                            );
                        }
                    }
                }
            }
            file_rows += runs.len() as u64;
        }

        n_entries += file_rows;
    }

    let pot_sum = first_pot.values().sum();
    let unique_pairs = first_pot.into_keys().collect();
    let scan = ScanResult { unique_pairs, pot_sum, n_entries };
    tracing::info!(
        files = paths.len(),
        unique_pairs = scan.unique_pairs.len(),
        pot_sum = scan.pot_sum,
        n_entries = scan.n_entries,
        "subrun scan complete"
    );
    Ok(scan)
}
