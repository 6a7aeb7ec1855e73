//! Structured JSON logger for pairdb
//!
//! - One log line = one event
//! - `event` first, then `severity`, then `ts`, then fields sorted by key
//! - Synchronous, no buffering
//! - INFO/WARN go to stdout, ERROR/FATAL go to stderr

use std::fmt;
use std::io::{self, Write};

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Normal operations
    Info = 1,
    /// Recoverable issues (skipped records)
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable, process exits
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured logger that outputs JSON lines
pub struct Logger;

impl Logger {
    /// Log an event with the given severity and fields.
    ///
    /// Routes ERROR and FATAL to stderr, everything else to stdout.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity >= Severity::Error {
            Self::log_to_writer(severity, event, fields, &mut io::stderr());
        } else {
            Self::log_to_writer(severity, event, fields, &mut io::stdout());
        }
    }

    fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let line = Self::render(severity, event, &ts, fields);

        // Write atomically (one syscall); a failed log write never fails ingestion
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    fn render(severity: Severity, event: &str, ts: &str, fields: &[(&str, &str)]) -> String {
        let mut output = String::with_capacity(256);

        output.push('{');
        Self::push_pair(&mut output, "event", event);
        output.push(',');
        Self::push_pair(&mut output, "severity", severity.as_str());
        output.push(',');
        Self::push_pair(&mut output, "ts", ts);

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push(',');
            Self::push_pair(&mut output, key, value);
        }

        output.push_str("}\n");
        output
    }

    fn push_pair(output: &mut String, key: &str, value: &str) {
        output.push_str(&Value::String(key.to_owned()).to_string());
        output.push(':');
        output.push_str(&Value::String(value.to_owned()).to_string());
    }
}

/// Capture logs to a buffer for testing
#[cfg(test)]
pub fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    Logger::log_to_writer(severity, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}
