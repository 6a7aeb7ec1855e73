//! Line-oriented manifest parser
//!
//! Format, one record per line:
//!
//! ```text
//! <source_a> <source_b> <label>
//! ```
//!
//! Tokens are separated by any whitespace. Blank lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::errors::{ManifestError, ManifestResult};
use super::record::{ManifestRecord, MAX_RECORDS};

/// Loads and parses the manifest at `path`.
pub fn load_manifest(path: &Path) -> ManifestResult<Vec<ManifestRecord>> {
    let file = File::open(path).map_err(|source| ManifestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(BufReader::new(file))
}

/// Parses manifest lines from any buffered reader, in order.
pub fn parse_manifest<R: BufRead>(reader: R) -> ManifestResult<Vec<ManifestRecord>> {
    parse_with_limit(reader, MAX_RECORDS)
}

pub(crate) fn parse_with_limit<R: BufRead>(
    reader: R,
    max_records: usize,
) -> ManifestResult<Vec<ManifestRecord>> {
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| ManifestError::Read {
            line: line_no,
            source,
        })?;

        if let Some(record) = parse_line(line_no, &line)? {
            if records.len() == max_records {
                return Err(ManifestError::TooManyRecords {
                    line: line_no,
                    max: max_records,
                });
            }
            records.push(record);
        }
    }

    Ok(records)
}

fn parse_line(line_no: usize, line: &str) -> ManifestResult<Option<ManifestRecord>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [] => Ok(None),
        [source_a, source_b, label] => {
            let label = label.parse::<f64>().map_err(|_| ManifestError::InvalidLabel {
                line: line_no,
                token: (*label).to_string(),
            })?;
            Ok(Some(ManifestRecord::new(*source_a, *source_b, label)))
        }
        other => Err(ManifestError::MalformedLine {
            line: line_no,
            tokens: other.len(),
        }),
    }
}
