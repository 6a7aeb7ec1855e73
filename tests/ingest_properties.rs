//! End-to-end conversion properties
//!
//! Runs full conversions into temp directories and checks the resulting
//! stores through the read side of each backend.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use tempfile::TempDir;

use pairdb::datum::Datum;
use pairdb::decode::{DecodeError, DecodeOptions, DecodeResult, DecodedPair, Decoder};
use pairdb::ingest::{self, IngestConfig, IngestError};
use pairdb::store::{BackendKind, Database, Mode};

fn write_png(root: &Path, name: &str, width: u32, height: u32) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 99]))
        .save(path)
        .unwrap();
}

fn config_for(temp: &TempDir, manifest: &str) -> IngestConfig {
    let list = temp.path().join("list.txt");
    fs::write(&list, manifest).unwrap();
    IngestConfig::new(temp.path(), list, temp.path().join("db"))
}

fn open_read(path: &Path, kind: BackendKind) -> Box<dyn Database> {
    kind.open(path, Mode::Read).unwrap()
}

fn keys(db: &dyn Database) -> Vec<String> {
    db.keys()
        .into_iter()
        .map(|k| String::from_utf8(k).unwrap())
        .collect()
}

fn datum(db: &dyn Database, key: &str) -> Datum {
    Datum::deserialize(&db.get(key.as_bytes()).unwrap().unwrap()).unwrap()
}

/// Constant-size payloads, no files touched
struct ConstDecoder(usize);

impl Decoder for ConstDecoder {
    fn decode(&self, _: &str, _: &str, _: &DecodeOptions) -> DecodeResult<DecodedPair> {
        Ok(DecodedPair {
            channels: 2,
            height: 1,
            width: 1,
            encoded: false,
            data: vec![0u8; self.0],
        })
    }
}

#[test]
fn two_record_scenario() {
    let temp = TempDir::new().unwrap();
    for name in ["a/1.png", "b/1.png", "a/2.png", "b/2.png"] {
        write_png(temp.path(), name, 4, 3);
    }
    let config = config_for(&temp, "a/1.png b/1.png 3.0\na/2.png b/2.png 5.0\n");

    let summary = ingest::run(&config).unwrap();
    assert_eq!(summary.labels_written, 2);
    assert_eq!(summary.images_written, 2);
    assert!(summary.key_sets_match());

    let labels = open_read(&config.labels_path(), BackendKind::Ordered);
    assert_eq!(
        keys(labels.as_ref()),
        vec!["00000000_a/1.png_b/1.png", "00000001_a/2.png_b/2.png"]
    );
    let first = datum(labels.as_ref(), "00000000_a/1.png_b/1.png");
    let second = datum(labels.as_ref(), "00000001_a/2.png_b/2.png");
    assert_eq!((first.float_data.clone(), first.label), (vec![3.0], 0));
    assert_eq!((second.float_data.clone(), second.label), (vec![5.0], 1));

    let images = open_read(&config.images_path(), BackendKind::Ordered);
    let pair = datum(images.as_ref(), "00000001_a/2.png_b/2.png");
    assert_eq!((pair.channels, pair.height, pair.width), (6, 3, 4));
    assert_eq!(pair.data.len(), 6 * 3 * 4);
    assert_eq!(pair.label, 1);
    assert_eq!(pair.param, "00000001_a/2.png_b/2.png");
}

#[test]
fn decode_failure_leaves_label_without_image() {
    let temp = TempDir::new().unwrap();
    write_png(temp.path(), "a1.png", 2, 2);
    write_png(temp.path(), "b1.png", 2, 2);
    let config = config_for(&temp, "a1.png b1.png 1\nmissing.png b1.png 2\n");

    let summary = ingest::run(&config).unwrap();
    assert_eq!(summary.images_skipped, 1);
    assert!(!summary.key_sets_match());

    let labels = open_read(&config.labels_path(), BackendKind::Ordered);
    let images = open_read(&config.images_path(), BackendKind::Ordered);
    assert_eq!(labels.len(), 2);
    assert_eq!(images.len(), 1);
    assert_eq!(keys(images.as_ref()), vec!["00000000_a1.png_b1.png"]);
}

#[test]
fn size_mismatch_aborts_image_pass() {
    let temp = TempDir::new().unwrap();
    write_png(temp.path(), "small_a.png", 2, 2);
    write_png(temp.path(), "small_b.png", 2, 2);
    write_png(temp.path(), "big_a.png", 3, 3);
    write_png(temp.path(), "big_b.png", 3, 3);
    let mut config = config_for(
        &temp,
        "small_a.png small_b.png 0\nbig_a.png big_b.png 1\nsmall_a.png small_b.png 2\n",
    );
    config.check_size = true;

    let err = ingest::run(&config).unwrap_err();
    match &err {
        IngestError::SizeMismatch {
            key,
            expected,
            actual,
        } => {
            assert_eq!(key, "00000001_big_a.png_big_b.png");
            assert_eq!((*expected, *actual), (2 * 2 * 6, 3 * 3 * 6));
        }
        other => panic!("unexpected error {:?}", other),
    }

    let images = open_read(&config.images_path(), BackendKind::Ordered);
    assert!(images.is_empty());
}

#[test]
fn uniform_sizes_pass_size_check_with_resize() {
    let temp = TempDir::new().unwrap();
    write_png(temp.path(), "x.png", 5, 5);
    write_png(temp.path(), "y.png", 9, 4);
    let mut config = config_for(&temp, "x.png x.png 0\ny.png y.png 1\nx.png y.png 2\n");
    config.check_size = true;
    config.gray = true;
    config.resize_width = 4;
    config.resize_height = 2;

    let summary = ingest::run(&config).unwrap();
    assert_eq!(summary.images_written, 3);

    let images = open_read(&config.images_path(), BackendKind::Ordered);
    let pair = datum(images.as_ref(), "00000002_x.png_y.png");
    assert_eq!((pair.channels, pair.height, pair.width), (2, 2, 4));
}

#[test]
fn commit_count_follows_batch_size() {
    let temp = TempDir::new().unwrap();
    let manifest: String = (0..2500).map(|i| format!("a{i} b{i} {i}\n")).collect();
    let config = config_for(&temp, &manifest);

    let summary = ingest::run_with_decoder(&config, &ConstDecoder(4)).unwrap();
    assert_eq!(summary.image_commits, 3);
    assert_eq!(summary.label_commits, 3);
    assert_eq!(summary.metrics.commits, 6);

    let images = open_read(&config.images_path(), BackendKind::Ordered);
    assert_eq!(images.len(), 2500);
}

/// Fails every pair whose first source starts with "bad"
struct SkipBad;

impl Decoder for SkipBad {
    fn decode(&self, a: &str, _: &str, _: &DecodeOptions) -> DecodeResult<DecodedPair> {
        if a.starts_with("bad") {
            return Err(DecodeError::ShapeMismatch {
                first: (1, 1),
                second: (2, 2),
            });
        }
        ConstDecoder(4).decode(a, a, &DecodeOptions::default())
    }
}

#[test]
fn image_commits_follow_successful_puts() {
    for (total, image_commits) in [(1001, 1), (1002, 2)] {
        let temp = TempDir::new().unwrap();
        let manifest: String = (0..total)
            .map(|i| match i {
                500 => "bad b 0\n".to_string(),
                _ => format!("a{i} b{i} 0\n"),
            })
            .collect();
        let config = config_for(&temp, &manifest);

        let summary = ingest::run_with_decoder(&config, &SkipBad).unwrap();
        assert_eq!(summary.images_skipped, 1);
        assert_eq!(summary.images_written, total - 1);
        assert_eq!(summary.image_commits, image_commits);
        // Every label is written, so the label side batches on records
        assert_eq!(summary.label_commits, 2);

        let images = open_read(&config.images_path(), BackendKind::Ordered);
        assert_eq!(images.len(), total - 1);
    }
}

#[test]
fn exact_batch_multiple_commits_once() {
    let temp = TempDir::new().unwrap();
    let manifest: String = (0..1000).map(|i| format!("a{i} b{i} 0.5\n")).collect();
    let mut config = config_for(&temp, &manifest);
    config.backend = BackendKind::Hash;

    let summary = ingest::run_with_decoder(&config, &ConstDecoder(4)).unwrap();
    assert_eq!(summary.image_commits, 1);

    let images = pairdb::store::HashStore::open(&config.images_path(), Mode::Read).unwrap();
    assert_eq!(images.tables().len(), 1);
    assert_eq!(images.tables()[0].entries, 1000);
}

#[test]
fn keys_sort_in_manifest_order_without_shuffle() {
    let temp = TempDir::new().unwrap();
    // Source names chosen so that sorting by name alone would reorder them
    let config = config_for(&temp, "z z 1\nm m 2\na a 3\n");

    ingest::run_with_decoder(&config, &ConstDecoder(1)).unwrap();
    let labels = open_read(&config.labels_path(), BackendKind::Ordered);
    assert_eq!(
        keys(labels.as_ref()),
        vec!["00000000_z_z", "00000001_m_m", "00000002_a_a"]
    );
}

#[test]
fn shuffle_is_a_bijection() {
    let temp = TempDir::new().unwrap();
    let manifest: String = (0..200).map(|i| format!("a{i} b{i} {i}\n")).collect();
    let mut config = config_for(&temp, &manifest);
    config.shuffle = true;

    ingest::run_with_decoder(&config, &ConstDecoder(1)).unwrap();

    let labels = open_read(&config.labels_path(), BackendKind::Ordered);
    let mut seen: HashMap<String, f32> = HashMap::new();
    for (index, key) in keys(labels.as_ref()).iter().enumerate() {
        let mut parts = key.splitn(3, '_');
        assert_eq!(parts.next().unwrap(), format!("{:08}", index));
        let a = parts.next().unwrap();
        let b = parts.next().unwrap();
        assert_eq!(&a[1..], &b[1..]);

        let value = datum(labels.as_ref(), key);
        assert_eq!(value.label, index as u64);
        seen.insert(a.to_string(), value.float_data[0]);
    }

    assert_eq!(seen.len(), 200);
    for i in 0..200 {
        assert_eq!(seen[&format!("a{i}")], i as f32);
    }
}

#[test]
fn existing_store_is_refused() {
    let temp = TempDir::new().unwrap();
    let config = config_for(&temp, "a b 1\n");
    ingest::run_with_decoder(&config, &ConstDecoder(1)).unwrap();

    let err = ingest::run_with_decoder(&config, &ConstDecoder(1)).unwrap_err();
    assert_eq!(err.code(), "PAIRDB_STORE_EXISTS");

    // First run's data is untouched
    let labels = open_read(&config.labels_path(), BackendKind::Ordered);
    assert_eq!(labels.len(), 1);
}

#[test]
fn both_backends_hold_the_same_records() {
    let mut contents = Vec::new();
    for kind in [BackendKind::Ordered, BackendKind::Hash] {
        let temp = TempDir::new().unwrap();
        let mut config = config_for(&temp, "p q 1\nr s 2\nt u 3\n");
        config.backend = kind;
        config.batch_size = 2;

        ingest::run_with_decoder(&config, &ConstDecoder(3)).unwrap();
        let images = open_read(&config.images_path(), kind);
        let entries: Vec<(String, Datum)> = keys(images.as_ref())
            .into_iter()
            .map(|k| {
                let d = datum(images.as_ref(), &k);
                (k, d)
            })
            .collect();
        contents.push(entries);
    }
    assert_eq!(contents[0], contents[1]);
}

#[test]
fn failing_decoder_yields_empty_images_store() {
    struct AlwaysFails;

    impl Decoder for AlwaysFails {
        fn decode(&self, a: &str, _: &str, _: &DecodeOptions) -> DecodeResult<DecodedPair> {
            Err(DecodeError::Read {
                path: a.into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            })
        }
    }

    let temp = TempDir::new().unwrap();
    let config = config_for(&temp, "a b 1\nc d 2\n");
    let summary = ingest::run_with_decoder(&config, &AlwaysFails).unwrap();

    assert_eq!(summary.images_skipped, 2);
    assert_eq!(summary.image_commits, 0);
    assert!(open_read(&config.images_path(), BackendKind::Ordered).is_empty());
    assert_eq!(open_read(&config.labels_path(), BackendKind::Ordered).len(), 2);
}
