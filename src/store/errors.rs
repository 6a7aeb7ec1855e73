//! Store error types
//!
//! Error codes:
//! - PAIRDB_STORE_EXISTS (ERROR) - create-new target already present
//! - PAIRDB_STORE_NOT_FOUND (ERROR) - read target missing
//! - PAIRDB_STORE_READ_ONLY (ERROR) - write attempted on a read handle
//! - PAIRDB_STORE_INVALID_ARGUMENT (ERROR) - bad committer configuration
//! - PAIRDB_STORE_IO_ERROR (FATAL)
//! - PAIRDB_STORE_COMMIT_FAILED (FATAL)
//! - PAIRDB_STORE_CORRUPTION (FATAL)
//!
//! Within a conversion run every store error aborts the run; severity only
//! separates caller mistakes (nothing was written) from on-disk failures.

use std::fmt;
use std::io;
use std::path::Path;

/// Severity levels for store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Rejected before touching disk
    Error,
    /// Disk state may be partial
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    AlreadyExists,
    NotFound,
    ReadOnly,
    InvalidArgument,
    Io,
    CommitFailed,
    Corruption,
}

impl StoreErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::AlreadyExists => "PAIRDB_STORE_EXISTS",
            StoreErrorCode::NotFound => "PAIRDB_STORE_NOT_FOUND",
            StoreErrorCode::ReadOnly => "PAIRDB_STORE_READ_ONLY",
            StoreErrorCode::InvalidArgument => "PAIRDB_STORE_INVALID_ARGUMENT",
            StoreErrorCode::Io => "PAIRDB_STORE_IO_ERROR",
            StoreErrorCode::CommitFailed => "PAIRDB_STORE_COMMIT_FAILED",
            StoreErrorCode::Corruption => "PAIRDB_STORE_CORRUPTION",
        }
    }

    /// Returns the severity level for this code
    pub fn severity(&self) -> Severity {
        match self {
            StoreErrorCode::AlreadyExists
            | StoreErrorCode::NotFound
            | StoreErrorCode::ReadOnly
            | StoreErrorCode::InvalidArgument => Severity::Error,
            StoreErrorCode::Io | StoreErrorCode::CommitFailed | StoreErrorCode::Corruption => {
                Severity::Fatal
            }
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error with code, message and optional context
#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StoreError {
    fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    fn with_source(mut self, source: io::Error) -> Self {
        self.source = Some(source);
        self
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Create-new open found an existing target
    pub fn already_exists(path: &Path) -> Self {
        Self::new(
            StoreErrorCode::AlreadyExists,
            format!("Store already exists: {}", path.display()),
        )
    }

    /// Read open found nothing at the target
    pub fn not_found(path: &Path) -> Self {
        Self::new(
            StoreErrorCode::NotFound,
            format!("Store not found: {}", path.display()),
        )
    }

    pub fn read_only(path: &Path) -> Self {
        Self::new(
            StoreErrorCode::ReadOnly,
            format!("Store opened read-only: {}", path.display()),
        )
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::InvalidArgument, message)
    }

    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StoreErrorCode::Io, message).with_source(source)
    }

    /// A commit could not be made durable
    pub fn commit_failed(txn_id: u64, message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StoreErrorCode::CommitFailed, message)
            .with_details(format!("txn: {}", txn_id))
            .with_source(source)
    }

    pub fn corruption(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Corruption, message)
    }

    /// Corruption with the file and byte offset where it was detected
    pub fn corruption_at(path: &Path, offset: u64, reason: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Corruption, reason).with_details(format!(
            "file: {}, byte_offset: {}",
            path.display(),
            offset
        ))
    }

    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
