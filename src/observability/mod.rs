//! Observability for pairdb runs
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//! - Monotonic ingestion counters
//!
//! Observability is read-only: a failed log write never fails a run.
//!
//! ```ignore
//! use pairdb::observability::{log_event_with_fields, Event, IngestMetrics};
//!
//! log_event_with_fields(Event::ManifestLoaded, &[("records", "42")]);
//!
//! let metrics = IngestMetrics::new();
//! metrics.increment_images_skipped();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{IngestMetrics, MetricsSnapshot};

fn severity_for(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_warning() {
        Severity::Warn
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_for(event), event.as_str(), fields);
}
