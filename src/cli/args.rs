//! CLI argument definitions using clap
//!
//! ```text
//! pairdb [FLAGS] ROOTFOLDER LISTFILE DB_NAME
//! ```
//!
//! Flags keep their underscore spelling (`--resize_width`); the hyphenated
//! form is accepted as an alias.

use std::path::PathBuf;

use clap::Parser;

use crate::ingest::{ConfigError, IngestConfig};
use crate::store::BackendKind;

/// Convert a set of image pairs and labels into a labels store and an
/// images store.
///
/// LISTFILE holds one `source_a source_b label` line per record, with source
/// paths relative to ROOTFOLDER.
#[derive(Parser, Debug)]
#[command(name = "pairdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Folder the manifest's source paths are relative to
    #[arg(value_name = "ROOTFOLDER")]
    pub root_folder: PathBuf,

    /// Manifest of `source_a source_b label` lines
    #[arg(value_name = "LISTFILE")]
    pub list_file: PathBuf,

    /// Images store to create
    #[arg(value_name = "DB_NAME")]
    pub db_name: PathBuf,

    /// Treat images as grayscale
    #[arg(long)]
    pub gray: bool,

    /// Randomly shuffle the order of records
    #[arg(long)]
    pub shuffle: bool,

    /// Store backend: lmdb or leveldb [default: lmdb]
    #[arg(long)]
    pub backend: Option<BackendKind>,

    /// Width images are resized to (0 keeps the source size)
    #[arg(long = "resize_width", alias = "resize-width", allow_negative_numbers = true)]
    pub resize_width: Option<i64>,

    /// Height images are resized to (0 keeps the source size)
    #[arg(long = "resize_height", alias = "resize-height", allow_negative_numbers = true)]
    pub resize_height: Option<i64>,

    /// Require every image payload to have the same size
    #[arg(long = "check_size", alias = "check-size")]
    pub check_size: bool,

    /// Store encoded image files instead of raw pixels
    #[arg(long)]
    pub encoded: bool,

    /// Encode images as this type ('png', 'jpg', 'bmp'); implies --encoded
    #[arg(long = "encode_type", alias = "encode-type")]
    pub encode_type: Option<String>,

    /// Labels store to create [default: <DB_NAME>_labels]
    #[arg(long = "labels_db", alias = "labels-db")]
    pub labels_db: Option<PathBuf>,

    /// Records per transaction [default: 1000]
    #[arg(long = "batch_size", alias = "batch-size")]
    pub batch_size: Option<usize>,

    /// Seed for a reproducible shuffle
    #[arg(long = "shuffle_seed", alias = "shuffle-seed")]
    pub shuffle_seed: Option<u64>,

    /// Run the label and image passes in parallel
    #[arg(long = "concurrent_passes", alias = "concurrent-passes")]
    pub concurrent_passes: bool,

    /// JSON config file; flags given on the command line override it
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Builds the run configuration: config file first, then flags.
    pub fn into_config(self) -> Result<IngestConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => IngestConfig::load(path)?,
            None => IngestConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(self, config: &mut IngestConfig) {
        config.root_folder = self.root_folder;
        config.list_file = self.list_file;
        config.db_name = self.db_name;

        config.gray |= self.gray;
        config.shuffle |= self.shuffle;
        config.check_size |= self.check_size;
        config.encoded |= self.encoded;
        config.concurrent_passes |= self.concurrent_passes;

        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        // Negative sizes count as 0
        if let Some(width) = self.resize_width {
            config.resize_width = clamp_dimension(width);
        }
        if let Some(height) = self.resize_height {
            config.resize_height = clamp_dimension(height);
        }
        if let Some(encode_type) = self.encode_type {
            config.encode_type = encode_type;
        }
        if let Some(labels_db) = self.labels_db {
            config.labels_db = Some(labels_db);
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(seed) = self.shuffle_seed {
            config.shuffle_seed = Some(seed);
        }
    }
}

fn clamp_dimension(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pairdb").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_positionals_and_defaults() {
        let config = parse(&["root", "list.txt", "out/db"]).into_config().unwrap();
        assert_eq!(config.root_folder, PathBuf::from("root"));
        assert_eq!(config.list_file, PathBuf::from("list.txt"));
        assert_eq!(config.backend, BackendKind::Ordered);
        assert_eq!(config.batch_size, 1000);
        assert!(!config.shuffle);
    }

    #[test]
    fn test_underscore_flags() {
        let config = parse(&[
            "--gray",
            "--shuffle",
            "--backend",
            "leveldb",
            "--resize_width",
            "64",
            "--resize_height",
            "-5",
            "--check_size",
            "--encode_type",
            "png",
            "--batch_size",
            "10",
            "root",
            "list.txt",
            "db",
        ])
        .into_config()
        .unwrap();

        assert!(config.gray && config.shuffle && config.check_size);
        assert_eq!(config.backend, BackendKind::Hash);
        assert_eq!((config.resize_width, config.resize_height), (64, 0));
        assert_eq!(config.encode_type, "png");
        assert_eq!(config.batch_size, 10);
    }

    #[test]
    fn test_missing_positionals_rejected() {
        assert!(Cli::try_parse_from(["pairdb", "root", "list.txt"]).is_err());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(Cli::try_parse_from(["pairdb", "--backend", "rocksdb", "r", "l", "d"]).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pairdb.json");
        fs::write(&path, r#"{ "backend": "leveldb", "batch_size": 50, "gray": true }"#).unwrap();

        let config = parse(&[
            "--config",
            path.to_str().unwrap(),
            "--batch_size",
            "7",
            "root",
            "list.txt",
            "db",
        ])
        .into_config()
        .unwrap();

        assert_eq!(config.backend, BackendKind::Hash);
        assert_eq!(config.batch_size, 7);
        assert!(config.gray);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let err = parse(&["--batch_size", "0", "root", "list.txt", "db"])
            .into_config()
            .unwrap_err();
        assert_eq!(err.code(), "PAIRDB_CONFIG_INVALID");
    }
}
