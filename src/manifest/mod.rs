//! Manifest subsystem
//!
//! Reads the list of source pairs and labels, optionally shuffles it, and
//! derives the per-record store key shared by both writer passes.

mod errors;
mod parser;
mod record;
mod shuffle;

pub use errors::{ManifestError, ManifestResult};
pub use parser::{load_manifest, parse_manifest};
pub use record::{record_key, ManifestRecord, KEY_INDEX_WIDTH, MAX_RECORDS};
pub use shuffle::shuffle_records;
