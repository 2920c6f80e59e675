//! # bb-scan
//!
//! Run/subrun scanner over Parquet event metadata.
//!
//! Reads the `run`/`subrun` (and optional `pot`) columns of one or more
//! Parquet files, deduplicates (run, subrun) pairs across all rows, and sums
//! the per-subrun POT value exactly once per unique pair.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! let files = vec![PathBuf::from("stage_a.parquet")];
//! let scan = bb_scan::scan_subruns(&files).unwrap();
//! println!("{} unique subruns, {} POT", scan.unique_pairs.len(), scan.pot_sum);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod columns;
mod scanner;

pub use scanner::scan_subruns;
