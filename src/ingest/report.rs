//! Pass and run summaries

use serde::Serialize;
use uuid::Uuid;

use crate::observability::MetricsSnapshot;
use crate::store::CommitStats;

/// Outcome of one writer pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    /// Records put into the store
    pub written: usize,
    /// Records left out after a decode failure
    pub skipped: usize,
    pub commit: CommitStats,
}

/// Outcome of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub run_id: Uuid,
    /// Records in the manifest
    pub records: usize,
    pub labels_written: usize,
    pub images_written: usize,
    pub images_skipped: usize,
    pub label_commits: usize,
    pub image_commits: usize,
    pub metrics: MetricsSnapshot,
}

impl IngestSummary {
    pub(crate) fn new(
        run_id: Uuid,
        records: usize,
        labels: PassReport,
        images: PassReport,
        metrics: MetricsSnapshot,
    ) -> Self {
        Self {
            run_id,
            records,
            labels_written: labels.written,
            images_written: images.written,
            images_skipped: images.skipped,
            label_commits: labels.commit.commits,
            image_commits: images.commit.commits,
            metrics,
        }
    }

    /// False when skipped records left label keys with no image
    pub fn key_sets_match(&self) -> bool {
        self.labels_written == self.images_written
    }
}
