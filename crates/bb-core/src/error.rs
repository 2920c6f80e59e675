//! Error types for beambook

use std::path::PathBuf;

use thiserror::Error;

/// beambook error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parquet read error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Malformed or empty caller input (filelists, stage specs, list rows)
    #[error("Input error: {0}")]
    Input(String),

    /// Cross-fragment consistency violation (kind/beam mismatch)
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// A persisted container is missing a required table, row, or column
    #[error("Missing field '{field}' in {path}")]
    MissingField {
        /// Container path that was being read.
        path: PathBuf,
        /// Table, row, or column that was expected.
        field: String,
    },

    /// Failed to open a file or database, with path context
    #[error("Failed to open {path}: {reason}")]
    Open {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },
}

impl Error {
    /// Shorthand for a [`Error::MissingField`].
    pub fn missing(path: impl Into<PathBuf>, field: impl Into<String>) -> Self {
        Error::MissingField { path: path.into(), field: field.into() }
    }

    /// Shorthand for an [`Error::Open`].
    pub fn open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Open { path: path.into(), reason: reason.to_string() }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
