//! Manifest records and the record key scheme
//!
//! A record's identity is its position in the (possibly shuffled) sequence.
//! The position is not stored on the record; writers pass it alongside.

/// Zero-padding width of the sequence index in a key.
///
/// Bounds a manifest to 10^8 records without key collision or misordering.
pub const KEY_INDEX_WIDTH: usize = 8;

/// Largest number of records a manifest may hold
pub const MAX_RECORDS: usize = 100_000_000;

/// One manifest line: a source pair and its numeric label
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestRecord {
    /// First source path, relative to the root folder
    pub source_a: String,
    /// Second source path, relative to the root folder
    pub source_b: String,
    /// Scalar label as written in the manifest
    pub label: f64,
}

impl ManifestRecord {
    pub fn new(source_a: impl Into<String>, source_b: impl Into<String>, label: f64) -> Self {
        Self {
            source_a: source_a.into(),
            source_b: source_b.into(),
            label,
        }
    }

    /// Key of this record when it sits at `sequence_index`
    pub fn key(&self, sequence_index: usize) -> String {
        record_key(sequence_index, &self.source_a, &self.source_b)
    }
}

/// Derives the store key for a record.
///
/// `{index:08}_{source_a}_{source_b}`. Pure: identical inputs always give
/// identical keys, and keys sort lexicographically in index order for every
/// index below [`MAX_RECORDS`].
pub fn record_key(sequence_index: usize, source_a: &str, source_b: &str) -> String {
    format!(
        "{:0width$}_{}_{}",
        sequence_index,
        source_a,
        source_b,
        width = KEY_INDEX_WIDTH
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(record_key(0, "a/1.jpg", "b/1.jpg"), "00000000_a/1.jpg_b/1.jpg");
        assert_eq!(record_key(1, "a/2.jpg", "b/2.jpg"), "00000001_a/2.jpg_b/2.jpg");
        assert_eq!(record_key(12_345_678, "x", "y"), "12345678_x_y");
    }

    #[test]
    fn test_key_is_idempotent() {
        let record = ManifestRecord::new("left.png", "right.png", 1.5);
        assert_eq!(record.key(42), record.key(42));
        assert_eq!(record.key(42), record_key(42, "left.png", "right.png"));
    }

    #[test]
    fn test_keys_sort_by_index() {
        // Sources deliberately sort against the index order
        let keys: Vec<String> = [(9, "a", "a"), (10, "z", "z"), (99_999_999, "0", "0")]
            .iter()
            .map(|(i, a, b)| record_key(*i, a, b))
            .collect();

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
