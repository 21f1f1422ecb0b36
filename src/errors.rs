//! Error types for acquisition and consolidation

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("Failed to fetch archive listing from {url}: {source}")]
    Listing {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid listing URL '{0}'")]
    InvalidUrl(String),

    #[error("Download of {name} failed after {attempts} attempt(s): {source}")]
    Download {
        name: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("Archive {path} is corrupt: {source}")]
    CorruptArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-file failure while reading a delimited table. Never fatal to a run.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file has no header row")]
    MissingHeader,

    #[error("line {line}: expected at most {expected} fields, found {found}")]
    TooManyFields {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("malformed delimited text: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum ConsolidationError {
    #[error("No .csv files found under {0}")]
    NoInputFiles(PathBuf),

    #[error("No files were grouped for consolidation under {base_dir} ({discovered} discovered, {unclassified} unclassified, {unreadable} unreadable)")]
    NoGroups {
        base_dir: PathBuf,
        discovered: usize,
        unclassified: usize,
        unreadable: usize,
    },

    #[error("Cannot read base directory {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl ConsolidationError {
    /// Whether this error halts the run before any output is produced.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            ConsolidationError::NoInputFiles(_)
                | ConsolidationError::NoGroups { .. }
                | ConsolidationError::Walk { .. }
        )
    }
}
