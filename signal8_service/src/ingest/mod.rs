//! Reading raw event inputs from disk.
//!
//! Submodules:
//! - `csv`      — HKO 10-minute wind CSVs into a `RawTimeline`.
//! - `metadata` — markdown signal, portal and casualty tables into per-event metadata.

pub mod csv;
pub mod metadata;

use std::path::PathBuf;

/// Errors that can arise while reading event inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    /// A file or directory could not be read.
    Io { path: PathBuf, message: String },
    /// A CSV file lacks one of the columns the loader depends on.
    MissingColumn { path: PathBuf, column: String },
    /// A required metadata table never appeared in its file.
    TableNotFound { path: PathBuf, header: String },
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        IngestError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Io { path, message } => {
                write!(f, "I/O error reading {}: {}", path.display(), message)
            }
            IngestError::MissingColumn { path, column } => {
                write!(f, "Missing column '{}' in {}", column, path.display())
            }
            IngestError::TableNotFound { path, header } => {
                write!(f, "No table with header '{}' in {}", header, path.display())
            }
        }
    }
}

impl std::error::Error for IngestError {}
