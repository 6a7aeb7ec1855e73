//! Run configuration
//!
//! Every flag of the command line has a field here, so a run can be fully
//! described by a JSON file. Paths default to empty and are normally given
//! on the command line.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use crate::decode::{parse_encode_type, ColorMode, DecodeOptions, Encoding, Resize};
use crate::store::{BackendKind, DEFAULT_BATCH_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Folder the manifest's source names are relative to
    #[serde(default)]
    pub root_folder: PathBuf,

    /// Manifest file
    #[serde(default)]
    pub list_file: PathBuf,

    /// Images store directory
    #[serde(default)]
    pub db_name: PathBuf,

    /// Labels store directory (default: `<db_name>_labels`)
    #[serde(default)]
    pub labels_db: Option<PathBuf>,

    #[serde(default)]
    pub gray: bool,

    #[serde(default)]
    pub shuffle: bool,

    /// Fixed seed for a reproducible shuffle
    #[serde(default)]
    pub shuffle_seed: Option<u64>,

    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default)]
    pub resize_width: u32,

    #[serde(default)]
    pub resize_height: u32,

    /// Require every image payload to have the same byte length
    #[serde(default)]
    pub check_size: bool,

    #[serde(default)]
    pub encoded: bool,

    /// Target format for encoded payloads; implies `encoded`
    #[serde(default)]
    pub encode_type: String,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Run the label and image passes on separate threads
    #[serde(default)]
    pub concurrent_passes: bool,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            root_folder: PathBuf::new(),
            list_file: PathBuf::new(),
            db_name: PathBuf::new(),
            labels_db: None,
            gray: false,
            shuffle: false,
            shuffle_seed: None,
            backend: BackendKind::default(),
            resize_width: 0,
            resize_height: 0,
            check_size: false,
            encoded: false,
            encode_type: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            concurrent_passes: false,
        }
    }
}

impl IngestConfig {
    /// Creates a config for the three required paths with every option at
    /// its default.
    pub fn new(
        root_folder: impl Into<PathBuf>,
        list_file: impl Into<PathBuf>,
        db_name: impl Into<PathBuf>,
    ) -> Self {
        Self {
            root_folder: root_folder.into(),
            list_file: list_file.into(),
            db_name: db_name.into(),
            ..Self::default()
        }
    }

    /// Loads a config file. Validation is left to the caller, since the
    /// command line may still fill in missing paths.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.list_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("list_file is required".to_string()));
        }
        if self.db_name.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_name is required".to_string()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be > 0".to_string()));
        }
        if !self.encode_type.is_empty() && parse_encode_type(&self.encode_type).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unsupported encode_type '{}', expected png, jpg or bmp",
                self.encode_type
            )));
        }
        if self.labels_path() == self.images_path() {
            return Err(ConfigError::Invalid(format!(
                "labels and images stores share the path {}",
                self.images_path().display()
            )));
        }
        Ok(())
    }

    pub fn images_path(&self) -> PathBuf {
        self.db_name.components().collect()
    }

    /// Labels store path, defaulting to `<db_name>_labels`
    pub fn labels_path(&self) -> PathBuf {
        match &self.labels_db {
            Some(path) => path.components().collect(),
            None => {
                let mut name = self.images_path().into_os_string();
                name.push("_labels");
                PathBuf::from(name)
            }
        }
    }

    /// `encode_type` was set without `encoded`
    pub fn encode_type_implied(&self) -> bool {
        !self.encode_type.is_empty() && !self.encoded
    }

    pub fn decode_options(&self) -> DecodeOptions {
        let encoding = if self.encoded || !self.encode_type.is_empty() {
            Encoding::Encoded(parse_encode_type(&self.encode_type))
        } else {
            Encoding::Raw
        };

        DecodeOptions {
            color: ColorMode::from_gray_flag(self.gray),
            resize: Resize::target(self.resize_height, self.resize_width),
            encoding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = IngestConfig::new("root", "list.txt", "out/db");
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.backend, BackendKind::Ordered);
        assert!(config.validate().is_ok());
        assert_eq!(config.labels_path(), PathBuf::from("out/db_labels"));
        assert_eq!(config.decode_options(), DecodeOptions::default());
    }

    #[test]
    fn test_trailing_separator_in_db_name() {
        let config = IngestConfig::new("root", "list.txt", "out/db/");
        assert_eq!(config.labels_path(), PathBuf::from("out/db_labels"));
    }

    #[test]
    fn test_load_partial_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pairdb.json");
        fs::write(
            &path,
            r#"{ "backend": "leveldb", "gray": true, "batch_size": 250, "shuffle_seed": 7 }"#,
        )
        .unwrap();

        let config = IngestConfig::load(&path).unwrap();
        assert_eq!(config.backend, BackendKind::Hash);
        assert!(config.gray);
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.shuffle_seed, Some(7));
        assert!(!config.check_size);
        // Paths still missing
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pairdb.json");
        fs::write(&path, r#"{ "backend": "rocksdb" }"#).unwrap();

        let err = IngestConfig::load(&path).unwrap_err();
        assert_eq!(err.code(), "PAIRDB_CONFIG_PARSE");
    }

    #[test]
    fn test_zero_batch_size_invalid() {
        let mut config = IngestConfig::new("root", "list.txt", "db");
        config.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_unknown_encode_type_invalid() {
        let mut config = IngestConfig::new("root", "list.txt", "db");
        config.encode_type = "webp".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_colliding_store_paths_invalid() {
        let mut config = IngestConfig::new("root", "list.txt", "db");
        config.labels_db = Some(PathBuf::from("db"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_encode_type_implies_encoded() {
        let mut config = IngestConfig::new("root", "list.txt", "db");
        config.encode_type = "png".to_string();
        assert!(config.encode_type_implied());
        assert_eq!(
            config.decode_options().encoding,
            Encoding::Encoded(Some(ImageFormat::Png))
        );

        config.encoded = true;
        assert!(!config.encode_type_implied());
    }

    #[test]
    fn test_resize_needs_both_dimensions() {
        let mut config = IngestConfig::new("root", "list.txt", "db");
        config.resize_width = 64;
        assert_eq!(config.decode_options().resize, None);

        config.resize_height = 32;
        assert_eq!(
            config.decode_options().resize,
            Some(Resize {
                height: 32,
                width: 64
            })
        );
    }
}
