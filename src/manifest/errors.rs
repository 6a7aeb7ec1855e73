//! Manifest error types
//!
//! Every manifest error is fatal and raised before any store is opened.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for manifest operations
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Manifest parsing errors. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot open manifest {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: read failed: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: syntax error, expected 3 tokens, found {tokens}")]
    MalformedLine { line: usize, tokens: usize },

    #[error("line {line}: label '{token}' is not a number")]
    InvalidLabel { line: usize, token: String },

    #[error("line {line}: manifest exceeds {max} records")]
    TooManyRecords { line: usize, max: usize },
}

impl ManifestError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ManifestError::Open { .. } => "PAIRDB_MANIFEST_OPEN",
            ManifestError::Read { .. } => "PAIRDB_MANIFEST_READ",
            ManifestError::MalformedLine { .. } => "PAIRDB_MANIFEST_MALFORMED_LINE",
            ManifestError::InvalidLabel { .. } => "PAIRDB_MANIFEST_INVALID_LABEL",
            ManifestError::TooManyRecords { .. } => "PAIRDB_MANIFEST_TOO_MANY_RECORDS",
        }
    }

    /// The offending line, if the error is tied to one
    pub fn line(&self) -> Option<usize> {
        match self {
            ManifestError::Open { .. } => None,
            ManifestError::Read { line, .. }
            | ManifestError::MalformedLine { line, .. }
            | ManifestError::InvalidLabel { line, .. }
            | ManifestError::TooManyRecords { line, .. } => Some(*line),
        }
    }
}
