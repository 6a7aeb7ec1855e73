//! Observable events for a pairdb run
//!
//! Events are explicit and typed; the logger only ever sees their
//! `as_str()` names.

use std::fmt;

/// Observable events in a conversion run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Run lifecycle
    /// Run configuration accepted, stores not yet opened
    RunBegin,
    /// All passes finished and stores flushed
    RunComplete,
    /// Run aborted by a fatal error (FATAL)
    RunFailed,

    // Manifest
    /// Manifest parsed
    ManifestLoaded,
    /// Manifest order randomized
    ManifestShuffled,
    /// `encode_type` given without `encoded`
    EncodeTypeImplied,

    // Writer passes
    /// A writer pass opened its store
    PassBegin,
    /// A transaction was committed
    BatchCommitted,
    /// A record failed to decode and was left out of the images store
    RecordSkipped,
    /// A writer pass flushed its final batch
    PassComplete,
}

impl Event {
    /// Returns the event name as it appears in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::RunBegin => "RUN_BEGIN",
            Event::RunComplete => "RUN_COMPLETE",
            Event::RunFailed => "RUN_FAILED",
            Event::ManifestLoaded => "MANIFEST_LOADED",
            Event::ManifestShuffled => "MANIFEST_SHUFFLED",
            Event::EncodeTypeImplied => "ENCODE_TYPE_IMPLIED",
            Event::PassBegin => "PASS_BEGIN",
            Event::BatchCommitted => "BATCH_COMMITTED",
            Event::RecordSkipped => "RECORD_SKIPPED",
            Event::PassComplete => "PASS_COMPLETE",
        }
    }

    /// Returns true if this event terminates the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::RunFailed)
    }

    /// Returns true if this event reports a recovered, per-record failure
    pub fn is_warning(&self) -> bool {
        matches!(self, Event::RecordSkipped)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake_case() {
        let events = [
            Event::RunBegin,
            Event::RunComplete,
            Event::RunFailed,
            Event::ManifestLoaded,
            Event::ManifestShuffled,
            Event::EncodeTypeImplied,
            Event::PassBegin,
            Event::BatchCommitted,
            Event::RecordSkipped,
            Event::PassComplete,
        ];

        for event in events {
            let name = event.as_str();
            assert!(name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_only_run_failed_is_fatal() {
        assert!(Event::RunFailed.is_fatal());
        assert!(!Event::RecordSkipped.is_fatal());
        assert!(!Event::BatchCommitted.is_fatal());
    }

    #[test]
    fn test_skip_is_warning() {
        assert!(Event::RecordSkipped.is_warning());
        assert!(!Event::PassComplete.is_warning());
    }
}
