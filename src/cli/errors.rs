//! CLI error types
//!
//! Every CLI error ends the process with exit status 1.

use std::fmt;
use std::io;

use crate::ingest::{ConfigError, IngestError};

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Missing or malformed arguments
    UsageError,
    /// Config file could not be loaded or is invalid
    ConfigError,
    /// stdout could not be written
    IoError,
    /// The conversion aborted
    RunFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::UsageError => "PAIRDB_CLI_USAGE",
            Self::ConfigError => "PAIRDB_CLI_CONFIG_ERROR",
            Self::IoError => "PAIRDB_CLI_IO_ERROR",
            Self::RunFailed => "PAIRDB_CLI_RUN_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::UsageError, msg)
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn run_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::RunFailed, msg)
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(format!("[{}] {}", e.code(), e))
    }
}

impl From<IngestError> for CliError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Config(config) => config.into(),
            other => Self::run_failed(format!("[{}] {}", other.code(), other)),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
