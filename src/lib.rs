//! pairdb - converts image-pair manifests into batch-committed key-value stores
//!
//! A manifest of `source_a source_b label` lines becomes two stores keyed by
//! `{index:08}_{source_a}_{source_b}`: one holding each record's label and
//! one holding each decoded image pair.

pub mod checksum;
pub mod cli;
pub mod datum;
pub mod decode;
pub mod ingest;
pub mod manifest;
pub mod observability;
pub mod store;

mod wire;
