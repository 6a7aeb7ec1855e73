//! Datum encoding errors

use thiserror::Error;

/// Result type for datum encoding
pub type DatumResult<T> = Result<T, DatumError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatumError {
    /// A variable-length field does not fit its u32 length prefix
    #[error("datum field '{field}' too large to encode: {len} bytes")]
    FieldTooLarge { field: &'static str, len: usize },

    #[error("datum truncated: {0}")]
    Truncated(String),

    #[error("invalid datum length: {0}")]
    InvalidLength(usize),

    #[error("datum checksum mismatch: computed {computed:08x}, stored {stored:08x}")]
    ChecksumMismatch { computed: u32, stored: u32 },

    #[error("datum param is not valid UTF-8")]
    InvalidUtf8,
}

impl DatumError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            DatumError::FieldTooLarge { .. } => "PAIRDB_DATUM_TOO_LARGE",
            DatumError::Truncated(_) | DatumError::InvalidLength(_) => "PAIRDB_DATUM_TRUNCATED",
            DatumError::ChecksumMismatch { .. } => "PAIRDB_DATUM_CORRUPTION",
            DatumError::InvalidUtf8 => "PAIRDB_DATUM_INVALID_UTF8",
        }
    }
}
