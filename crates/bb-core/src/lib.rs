//! # bb-core
//!
//! Core data model and error types for beambook.
//!
//! Everything downstream of the scanner speaks in terms of these types:
//! run/subrun identifier pairs, scan results, beam-exposure counter sums,
//! and the stage records the manifest persists.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    BeamMode, ExposureSums, RunSubrunPair, SampleKind, ScanResult, StageConfig, StageRecord,
};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
