//! Run-level errors
//!
//! Everything here aborts the run. Per-record decode failures never reach
//! this type; the payload writer absorbs them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::datum::DatumError;
use crate::manifest::ManifestError;
use crate::store::StoreError;

/// Result type for ingestion
pub type IngestResult<T> = Result<T, IngestError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "PAIRDB_CONFIG_READ",
            ConfigError::Parse { .. } => "PAIRDB_CONFIG_PARSE",
            ConfigError::Invalid(_) => "PAIRDB_CONFIG_INVALID",
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A store could not be opened or a commit failed
    #[error("{store} store: {source}")]
    Store {
        store: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("key {key}: cannot serialize datum: {source}")]
    Serialize {
        key: String,
        #[source]
        source: DatumError,
    },

    #[error("key {key}: payload size {actual} differs from expected {expected}")]
    SizeMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("{pass} pass panicked")]
    PassPanicked { pass: &'static str },
}

impl IngestError {
    pub(crate) fn store(store: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| IngestError::Store { store, source }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::Config(e) => e.code(),
            IngestError::Manifest(e) => e.code(),
            IngestError::Store { source, .. } => source.code().code(),
            IngestError::Serialize { source, .. } => source.code(),
            IngestError::SizeMismatch { .. } => "PAIRDB_INGEST_SIZE_MISMATCH",
            IngestError::PassPanicked { .. } => "PAIRDB_INGEST_PASS_PANICKED",
        }
    }

    /// Record key the error is tied to, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            IngestError::Serialize { key, .. } | IngestError::SizeMismatch { key, .. } => {
                Some(key)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_size_mismatch_names_key() {
        let err = IngestError::SizeMismatch {
            key: "00000003_a_b".to_string(),
            expected: 1200,
            actual: 900,
        };
        assert_eq!(err.code(), "PAIRDB_INGEST_SIZE_MISMATCH");
        assert_eq!(err.key(), Some("00000003_a_b"));
        assert!(err.to_string().contains("00000003_a_b"));
    }

    #[test]
    fn test_store_error_keeps_store_code() {
        let err = IngestError::store("images")(StoreError::already_exists(Path::new("out")));
        assert_eq!(err.code(), "PAIRDB_STORE_EXISTS");
        assert!(err.to_string().starts_with("images store:"));
    }

    #[test]
    fn test_manifest_error_converts() {
        let err: IngestError = ManifestError::MalformedLine { line: 4, tokens: 2 }.into();
        assert_eq!(err.code(), "PAIRDB_MANIFEST_MALFORMED_LINE");
        assert!(err.to_string().contains("line 4"));
    }
}
