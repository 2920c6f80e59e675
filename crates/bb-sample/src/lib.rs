//! # bb-sample
//!
//! Sample-level aggregation and persistence.
//!
//! One or more registered stages sharing a kind and beam mode fold into a
//! [`Sample`]: per-fragment sums, aggregate sums, and a single normalization
//! factor computed from the aggregate sums. Samples persist to a SQLite
//! container with full round-trip fidelity, and an analysis-facing TSV
//! sample list tracks where each persisted sample lives.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod aggregate;
mod list;
mod store;
mod types;

pub use aggregate::{aggregate, compute_normalization, SourcedStage};
pub use list::{read_sample_list, upsert_sample_list, write_sample_list, SampleListEntry};
pub use store::{read_sample, write_sample};
pub use types::{Sample, SampleFragment};
