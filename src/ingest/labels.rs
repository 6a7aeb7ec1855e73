//! Label pass: one 1x1x1 float datum per manifest record

use crate::datum::Datum;
use crate::manifest::ManifestRecord;
use crate::observability::{log_event_with_fields, Event, IngestMetrics};
use crate::store::BatchedCommitter;

use super::errors::{IngestError, IngestResult};
use super::report::PassReport;

const PASS: &str = "labels";

/// Writes every record's label into the labels store
pub struct LabelWriter<'a> {
    committer: BatchedCommitter,
    metrics: &'a IngestMetrics,
}

impl<'a> LabelWriter<'a> {
    pub fn new(committer: BatchedCommitter, metrics: &'a IngestMetrics) -> Self {
        Self { committer, metrics }
    }

    /// Runs the pass over `records` in order. Any failure aborts the pass
    /// with the open transaction uncommitted.
    pub fn run(mut self, records: &[ManifestRecord]) -> IngestResult<PassReport> {
        let store = self.committer.path().display().to_string();
        let count = records.len().to_string();
        log_event_with_fields(
            Event::PassBegin,
            &[
                ("pass", PASS),
                ("store", store.as_str()),
                ("records", count.as_str()),
            ],
        );

        for (index, record) in records.iter().enumerate() {
            let key = record.key(index);
            let bytes = Datum::label(index as u64, key.as_str(), record.label)
                .serialize()
                .map_err(|source| IngestError::Serialize {
                    key: key.clone(),
                    source,
                })?;

            self.metrics.add_bytes(bytes.len() as u64);
            self.committer
                .put(key, bytes)
                .map_err(IngestError::store(PASS))?;
            self.metrics.increment_labels_written();
        }

        let commit = self.committer.finish().map_err(IngestError::store(PASS))?;
        self.metrics.add_commits(commit.commits as u64);

        let written = commit.records.to_string();
        let commits = commit.commits.to_string();
        log_event_with_fields(
            Event::PassComplete,
            &[
                ("pass", PASS),
                ("written", written.as_str()),
                ("commits", commits.as_str()),
            ],
        );

        Ok(PassReport {
            written: commit.records,
            skipped: 0,
            commit,
        })
    }
}
