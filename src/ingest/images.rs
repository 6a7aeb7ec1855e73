//! Image pass: decode each pair and store it under the record key
//!
//! A pair that fails to decode is logged and skipped; the labels store still
//! holds its key. With size checking on, the first decoded payload fixes the
//! expected byte length and any later difference aborts the run.

use crate::datum::Datum;
use crate::decode::{DecodeOptions, Decoder};
use crate::manifest::ManifestRecord;
use crate::observability::{log_event_with_fields, Event, IngestMetrics};
use crate::store::BatchedCommitter;

use super::errors::{IngestError, IngestResult};
use super::report::PassReport;

const PASS: &str = "images";

/// Writes decoded image pairs into the images store
pub struct PayloadWriter<'a> {
    committer: BatchedCommitter,
    decoder: &'a dyn Decoder,
    options: DecodeOptions,
    check_size: bool,
    metrics: &'a IngestMetrics,
}

impl<'a> PayloadWriter<'a> {
    pub fn new(
        committer: BatchedCommitter,
        decoder: &'a dyn Decoder,
        options: DecodeOptions,
        metrics: &'a IngestMetrics,
    ) -> Self {
        Self {
            committer,
            decoder,
            options,
            check_size: false,
            metrics,
        }
    }

    pub fn with_size_check(mut self, check_size: bool) -> Self {
        self.check_size = check_size;
        self
    }

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

        let mut expected_size: Option<usize> = None;
        let mut skipped = 0;

        for (index, record) in records.iter().enumerate() {
            let key = record.key(index);

            let pair = match self
                .decoder
                .decode(&record.source_a, &record.source_b, &self.options)
            {
                Ok(pair) => pair,
                Err(e) => {
                    let reason = e.to_string();
                    log_event_with_fields(
                        Event::RecordSkipped,
                        &[
                            ("key", key.as_str()),
                            ("code", e.code()),
                            ("reason", reason.as_str()),
                        ],
                    );
                    self.metrics.increment_images_skipped();
                    skipped += 1;
                    continue;
                }
            };

            if self.check_size {
                let actual = pair.data.len();
                match expected_size {
                    None => expected_size = Some(actual),
                    Some(expected) if expected != actual => {
                        return Err(IngestError::SizeMismatch {
                            key,
                            expected,
                            actual,
                        });
                    }
                    Some(_) => {}
                }
            }

            let bytes = Datum::image(
                pair.channels,
                pair.height,
                pair.width,
                pair.encoded,
                pair.data,
                index as u64,
                key.as_str(),
            )
            .serialize()
            .map_err(|source| IngestError::Serialize {
                key: key.clone(),
                source,
            })?;

            self.metrics.add_bytes(bytes.len() as u64);
            self.committer
                .put(key, bytes)
                .map_err(IngestError::store(PASS))?;
            self.metrics.increment_images_written();
        }

        let commit = self.committer.finish().map_err(IngestError::store(PASS))?;
        self.metrics.add_commits(commit.commits as u64);

        let written = commit.records.to_string();
        let skipped_count = skipped.to_string();
        let commits = commit.commits.to_string();
        log_event_with_fields(
            Event::PassComplete,
            &[
                ("pass", PASS),
                ("written", written.as_str()),
                ("skipped", skipped_count.as_str()),
                ("commits", commits.as_str()),
            ],
        );

        Ok(PassReport {
            written: commit.records,
            skipped,
            commit,
        })
    }
}
