//! Decode errors
//!
//! A decode error never aborts a run: the payload writer logs it and skips
//! the record.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for decoding
pub type DecodeResult<T> = Result<T, DecodeError>;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot decode {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot encode {} as {format}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        format: String,
        #[source]
        source: image::ImageError,
    },

    /// Without a resize target both images of a pair must share one shape
    #[error("pair shapes differ: {}x{} vs {}x{}", .first.0, .first.1, .second.0, .second.1)]
    ShapeMismatch {
        first: (u32, u32),
        second: (u32, u32),
    },

    #[error("encoded image {} is too large: {len} bytes", .path.display())]
    TooLarge { path: PathBuf, len: usize },
}

impl DecodeError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::Read { .. } => "PAIRDB_DECODE_READ",
            DecodeError::Image { .. } => "PAIRDB_DECODE_IMAGE",
            DecodeError::Encode { .. } => "PAIRDB_DECODE_ENCODE",
            DecodeError::ShapeMismatch { .. } => "PAIRDB_DECODE_SHAPE_MISMATCH",
            DecodeError::TooLarge { .. } => "PAIRDB_DECODE_TOO_LARGE",
        }
    }
}
