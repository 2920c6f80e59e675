//! Aggregated sample record and its constituent fragments.

use serde::{Deserialize, Serialize};

use bb_core::{BeamMode, SampleKind};

/// One stage's contribution to a sample, copied out of its
/// [`bb_core::StageRecord`] at aggregation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleFragment {
    /// Stage name the fragment came from.
    pub fragment_name: String,
    /// Manifest path the stage record was read from.
    pub source_path: String,
    /// Inline per-subrun POT sum observed by the scan.
    pub subrun_pot_sum: f64,
    /// Target toroid POT from the exposure database.
    pub db_tortgt_pot: f64,
    /// Toroid 101 POT from the exposure database.
    pub db_tor101_pot: f64,
    /// Per-fragment normalization (diagnostic; the sample-level factor is
    /// computed from aggregate sums, not from these).
    pub normalization: f64,
    /// `subrun_pot_sum * normalization`.
    pub normalized_pot_sum: f64,
}

/// The aggregated, normalized provenance record for one dataset definition
/// (one kind, one beam mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Sample name.
    pub sample_name: String,
    /// Event content classification shared by every fragment.
    pub kind: SampleKind,
    /// Beam mode shared by every fragment.
    pub beam: BeamMode,
    /// Constituent fragments, in aggregation order.
    pub fragments: Vec<SampleFragment>,
    /// Sum of fragment `subrun_pot_sum`.
    pub subrun_pot_sum: f64,
    /// Sum of fragment `db_tortgt_pot`.
    pub db_tortgt_pot_sum: f64,
    /// Sum of fragment `db_tor101_pot`.
    pub db_tor101_pot_sum: f64,
    /// Normalization factor from the aggregate sums.
    pub normalization: f64,
    /// `subrun_pot_sum * normalization`.
    pub normalized_pot_sum: f64,
}
