//! Transactional key-value stores
//!
//! Two file-backed engines share one checksummed frame format:
//! - [`OrderedStore`] keeps a single append-only log with a key-ordered index
//! - [`HashStore`] writes one immutable table per commit behind a manifest
//!
//! Writers go through a [`BatchedCommitter`], which bounds every transaction
//! to a fixed number of puts.

mod backend;
mod committer;
mod errors;
mod frame;
mod hashed;
mod ordered;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

pub use backend::{BackendKind, Database, Mode, Transaction};
pub use committer::{BatchedCommitter, CommitStats, DEFAULT_BATCH_SIZE};
pub use errors::{Severity, StoreError, StoreErrorCode, StoreResult};
pub use frame::Frame;
pub use hashed::{HashStore, TableEntry, TableManifest};
pub use ordered::OrderedStore;

/// Creates a fresh store directory. An existing target is refused.
pub(crate) fn create_store_dir(dir: &Path) -> StoreResult<()> {
    if let Some(parent) = dir.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::io_error(
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
    }

    fs::create_dir(dir).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => StoreError::already_exists(dir),
        _ => StoreError::io_error(format!("Failed to create store: {}", dir.display()), e),
    })
}

/// fsync a directory so renames inside it are durable
pub(crate) fn fsync_dir(dir: &Path) -> StoreResult<()> {
    let handle = OpenOptions::new()
        .read(true)
        .open(dir)
        .map_err(|e| StoreError::io_error(format!("Failed to open {}", dir.display()), e))?;

    handle
        .sync_all()
        .map_err(|e| StoreError::io_error(format!("fsync directory failed: {}", dir.display()), e))
}
