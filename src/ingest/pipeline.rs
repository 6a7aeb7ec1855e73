//! Run orchestration
//!
//! Load manifest, optionally shuffle, open both stores, then run the label
//! and image passes. Both stores are created before either pass writes, so a
//! target that already exists fails the run with nothing written.

use std::path::Path;
use std::thread;

use uuid::Uuid;

use crate::decode::{Decoder, ImagePairDecoder};
use crate::manifest::{load_manifest, shuffle_records, ManifestRecord};
use crate::observability::{log_event_with_fields, Event, IngestMetrics};
use crate::store::{BatchedCommitter, StoreError};

use super::config::IngestConfig;
use super::errors::{IngestError, IngestResult};
use super::images::PayloadWriter;
use super::labels::LabelWriter;
use super::report::{IngestSummary, PassReport};

/// Runs a conversion with images read from `config.root_folder`.
pub fn run(config: &IngestConfig) -> IngestResult<IngestSummary> {
    let decoder = ImagePairDecoder::new(&config.root_folder);
    run_with_decoder(config, &decoder)
}

/// Runs a conversion with a caller-supplied decoder.
pub fn run_with_decoder(
    config: &IngestConfig,
    decoder: &dyn Decoder,
) -> IngestResult<IngestSummary> {
    let run_id = Uuid::new_v4();
    let run_id_str = run_id.to_string();

    match execute(config, decoder, run_id) {
        Ok(summary) => {
            let records = summary.records.to_string();
            let labels = summary.labels_written.to_string();
            let images = summary.images_written.to_string();
            let skipped = summary.images_skipped.to_string();
            let key_sets_match = summary.key_sets_match().to_string();
            let metrics = summary.metrics;
            let commits = metrics.commits.to_string();
            let bytes = metrics.bytes_written.to_string();
            log_event_with_fields(
                Event::RunComplete,
                &[
                    ("run_id", run_id_str.as_str()),
                    ("records", records.as_str()),
                    ("labels_written", labels.as_str()),
                    ("images_written", images.as_str()),
                    ("images_skipped", skipped.as_str()),
                    ("key_sets_match", key_sets_match.as_str()),
                    ("commits", commits.as_str()),
                    ("bytes_written", bytes.as_str()),
                ],
            );
            Ok(summary)
        }
        Err(e) => {
            let error = e.to_string();
            let mut fields = vec![
                ("run_id", run_id_str.as_str()),
                ("code", e.code()),
                ("error", error.as_str()),
            ];
            if let Some(key) = e.key() {
                fields.push(("key", key));
            }
            log_event_with_fields(Event::RunFailed, &fields);
            Err(e)
        }
    }
}

fn execute(
    config: &IngestConfig,
    decoder: &dyn Decoder,
    run_id: Uuid,
) -> IngestResult<IngestSummary> {
    config.validate()?;

    let run_id_str = run_id.to_string();
    let images_path = config.images_path();
    let labels_path = config.labels_path();
    let images_display = images_path.display().to_string();
    let labels_display = labels_path.display().to_string();
    let list_display = config.list_file.display().to_string();
    let batch_size = config.batch_size.to_string();
    log_event_with_fields(
        Event::RunBegin,
        &[
            ("run_id", run_id_str.as_str()),
            ("list_file", list_display.as_str()),
            ("images_db", images_display.as_str()),
            ("labels_db", labels_display.as_str()),
            ("backend", config.backend.name()),
            ("batch_size", batch_size.as_str()),
        ],
    );

    if config.encode_type_implied() {
        log_event_with_fields(
            Event::EncodeTypeImplied,
            &[("encode_type", config.encode_type.as_str())],
        );
    }

    let mut records = load_manifest(&config.list_file)?;
    let count = records.len().to_string();
    log_event_with_fields(Event::ManifestLoaded, &[("records", count.as_str())]);

    if config.shuffle {
        shuffle_records(&mut records, config.shuffle_seed);
        let seed = config
            .shuffle_seed
            .map_or_else(|| "random".to_string(), |s| s.to_string());
        log_event_with_fields(Event::ManifestShuffled, &[("seed", seed.as_str())]);
    }

    ensure_absent("labels", &labels_path)?;
    ensure_absent("images", &images_path)?;

    let labels_committer =
        BatchedCommitter::open(config.backend, &labels_path, config.batch_size)
            .map_err(IngestError::store("labels"))?;
    let images_committer =
        BatchedCommitter::open(config.backend, &images_path, config.batch_size)
            .map_err(IngestError::store("images"))?;

    let metrics = IngestMetrics::new();
    let label_writer = LabelWriter::new(labels_committer, &metrics);
    let payload_writer =
        PayloadWriter::new(images_committer, decoder, config.decode_options(), &metrics)
            .with_size_check(config.check_size);

    let (labels, images) = if config.concurrent_passes {
        run_concurrent(label_writer, payload_writer, &records)?
    } else {
        let labels = label_writer.run(&records)?;
        let images = payload_writer.run(&records)?;
        (labels, images)
    };

    Ok(IngestSummary::new(
        run_id,
        records.len(),
        labels,
        images,
        metrics.snapshot(),
    ))
}

/// Refuses an existing target before either store is created, so a refused
/// run leaves nothing behind.
fn ensure_absent(store: &'static str, path: &Path) -> IngestResult<()> {
    if path.exists() {
        return Err(IngestError::store(store)(StoreError::already_exists(path)));
    }
    Ok(())
}

/// Label pass on a scoped thread, image pass on the calling thread.
fn run_concurrent(
    label_writer: LabelWriter<'_>,
    payload_writer: PayloadWriter<'_>,
    records: &[ManifestRecord],
) -> IngestResult<(PassReport, PassReport)> {
    thread::scope(|s| {
        let labels = s.spawn(|| label_writer.run(records));
        let images = payload_writer.run(records);
        let labels = labels
            .join()
            .map_err(|_| IngestError::PassPanicked { pass: "labels" })?;
        Ok((labels?, images?))
    })
}
