//! Common data types for beambook

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A run/subrun identifier pair.
///
/// Identity is the pair itself; the derived `Ord` gives the canonical
/// ascending (run, subrun) ordering used for deterministic output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RunSubrunPair {
    /// Run number.
    pub run: i64,
    /// Subrun number within the run.
    pub subrun: i64,
}

impl RunSubrunPair {
    /// Create a new pair.
    pub fn new(run: i64, subrun: i64) -> Self {
        Self { run, subrun }
    }
}

impl fmt::Display for RunSubrunPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.run, self.subrun)
    }
}

/// Result of one scan over a set of input files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Deduplicated (run, subrun) pairs, in ascending order.
    pub unique_pairs: BTreeSet<RunSubrunPair>,
    /// Sum of the per-subrun inline POT value, taken once per unique pair
    /// (first observation wins).
    pub pot_sum: f64,
    /// Total rows scanned, duplicates included. Diagnostics only.
    pub n_entries: u64,
}

/// Beam-exposure counter sums reconciled against the exposure database.
///
/// Toroid sums are in protons (raw store units scaled by `pot_scale`);
/// the trigger/gate counters are plain counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposureSums {
    /// Target toroid POT sum.
    pub tortgt_sum: f64,
    /// Toroid 101 POT sum.
    pub tor101_sum: f64,
    /// Toroid 860 POT sum.
    pub tor860_sum: f64,
    /// Toroid 875 POT sum.
    pub tor875_sum: f64,
    /// EA9CNT device count sum.
    pub ea9cnt_sum: i64,
    /// E1DCNT device count sum.
    pub e1dcnt_sum: i64,
    /// External (off-beam) trigger count sum.
    pub exttrig_sum: i64,
    /// Gate 1 trigger count sum.
    pub gate1trig_sum: i64,
    /// Gate 2 trigger count sum.
    pub gate2trig_sum: i64,
}

/// Classification of a stage or sample's event content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    /// On-beam detector data.
    Data,
    /// Simulated neutrino interactions overlaid on data.
    Overlay,
    /// Simulated interactions outside the cryostat.
    Dirt,
    /// Off-beam (external trigger) data.
    Ext,
    /// Not classified.
    Unknown,
}

impl SampleKind {
    /// Canonical lowercase name, as stored in containers and sample lists.
    pub fn name(self) -> &'static str {
        match self {
            SampleKind::Data => "data",
            SampleKind::Overlay => "overlay",
            SampleKind::Dirt => "dirt",
            SampleKind::Ext => "ext",
            SampleKind::Unknown => "unknown",
        }
    }

    /// Parse a kind name, case-insensitively. Unrecognized names map to
    /// [`SampleKind::Unknown`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "data" => SampleKind::Data,
            "overlay" => SampleKind::Overlay,
            "dirt" => SampleKind::Dirt,
            "ext" => SampleKind::Ext,
            _ => SampleKind::Unknown,
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Beamline configuration a stage was recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeamMode {
    /// Booster Neutrino Beam.
    Bnb,
    /// Neutrinos at the Main Injector.
    Numi,
    /// Not recorded.
    Unknown,
}

impl BeamMode {
    /// Canonical lowercase name, as stored in containers and sample lists.
    pub fn name(self) -> &'static str {
        match self {
            BeamMode::Bnb => "bnb",
            BeamMode::Numi => "numi",
            BeamMode::Unknown => "unknown",
        }
    }

    /// Parse a beam mode name, case-insensitively. Unrecognized names map to
    /// [`BeamMode::Unknown`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "bnb" => BeamMode::Bnb,
            "numi" => BeamMode::Numi,
            _ => BeamMode::Unknown,
        }
    }
}

impl fmt::Display for BeamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of one processing stage: a unique name plus the filelist it
/// was scanned from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Unique stage name within a manifest.
    pub stage_name: String,
    /// Path to the newline-delimited filelist the stage was built from.
    pub filelist_path: String,
}

/// One registered stage: scan results plus database-reconciled exposure
/// sums. Created once, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage identity.
    pub cfg: StageConfig,
    /// Number of input files scanned.
    pub n_input_files: u64,
    /// Event content classification.
    pub kind: SampleKind,
    /// Beamline configuration.
    pub beam: BeamMode,
    /// Run/subrun scan results.
    pub scan: ScanResult,
    /// Exposure-database counter sums.
    pub exposure: ExposureSums,
}
