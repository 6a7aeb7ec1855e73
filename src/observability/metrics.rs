//! Ingestion counters
//!
//! - Counters only, monotonic
//! - Shared by both writer passes (which may run on separate threads)

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one conversion run.
///
/// Relaxed ordering is enough: counters are only read after the passes join.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    labels_written: AtomicU64,
    images_written: AtomicU64,
    images_skipped: AtomicU64,
    commits: AtomicU64,
    bytes_written: AtomicU64,
}

impl IngestMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_labels_written(&self) {
        self.labels_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_images_written(&self) {
        self.images_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_images_skipped(&self) {
        self.images_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_commits(&self, commits: u64) {
        self.commits.fetch_add(commits, Ordering::Relaxed);
    }

    /// Add serialized payload bytes handed to a store
    pub fn add_bytes(&self, bytes: u64) {
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Number of decode failures so far
    pub fn images_skipped(&self) -> u64 {
        self.images_skipped.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            labels_written: self.labels_written.load(Ordering::Relaxed),
            images_written: self.images_written.load(Ordering::Relaxed),
            images_skipped: self.images_skipped.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }

    /// Snapshot rendered as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of [`IngestMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub labels_written: u64,
    pub images_written: u64,
    pub images_skipped: u64,
    pub commits: u64,
    pub bytes_written: u64,
}
