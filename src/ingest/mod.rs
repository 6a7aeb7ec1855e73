//! Manifest-to-store conversion
//!
//! A run reads the manifest, optionally shuffles it, and writes two stores:
//! - labels: one float datum per record
//! - images: one decoded pair datum per record that decodes
//!
//! Each pass drives its own [`BatchedCommitter`](crate::store::BatchedCommitter)
//! against its own store; the passes share only the metrics registry.

mod config;
mod errors;
mod images;
mod labels;
mod pipeline;
mod report;

pub use config::IngestConfig;
pub use errors::{ConfigError, IngestError, IngestResult};
pub use images::PayloadWriter;
pub use labels::LabelWriter;
pub use pipeline::{run, run_with_decoder};
pub use report::{IngestSummary, PassReport};
