//! # Store Backend Trait
//!
//! A backend is a directory-backed key-value store written through explicit
//! transactions. Engines are chosen at startup by [`BackendKind`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::StoreResult;
use super::hashed::HashStore;
use super::ordered::OrderedStore;

/// How a store directory is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Create a fresh store; fails if the target already exists
    New,
    /// Open an existing store for reads only
    Read,
}

/// A pending batch of puts against one store.
///
/// Puts are buffered in order; nothing reaches disk until the owning
/// [`Database`] commits the transaction.
#[derive(Debug)]
pub struct Transaction {
    id: u64,
    puts: Vec<(Vec<u8>, Vec<u8>)>,
    pending_bytes: usize,
}

impl Transaction {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            puts: Vec::new(),
            pending_bytes: 0,
        }
    }

    /// Buffers a put. A later put of the same key wins on commit.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        let value = value.into();
        self.pending_bytes += key.len() + value.len();
        self.puts.push((key, value));
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty()
    }

    /// Key and value bytes buffered so far
    pub fn pending_bytes(&self) -> usize {
        self.pending_bytes
    }

    pub fn puts(&self) -> &[(Vec<u8>, Vec<u8>)] {
        &self.puts
    }
}

/// Backend trait for record stores
pub trait Database: Send {
    /// Directory holding the store
    fn path(&self) -> &Path;

    fn mode(&self) -> Mode;

    /// Starts an empty transaction. Fails on a read-only handle.
    fn new_transaction(&mut self) -> StoreResult<Transaction>;

    /// Atomically persists every put in `txn`; returns the number of puts.
    ///
    /// Either all puts of the transaction survive a crash or none do.
    fn commit(&mut self, txn: Transaction) -> StoreResult<usize>;

    /// Number of distinct committed keys
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the committed value for `key`
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// All committed keys in ascending byte order
    fn keys(&self) -> Vec<Vec<u8>>;
}

/// Storage engine selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Key-ordered append log (`lmdb`)
    #[serde(rename = "lmdb")]
    Ordered,
    /// Hash-indexed immutable tables (`leveldb`)
    #[serde(rename = "leveldb")]
    Hash,
}

impl BackendKind {
    /// Name used on the command line and in config files
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Ordered => "lmdb",
            BackendKind::Hash => "leveldb",
        }
    }

    /// Opens a store of this kind at `path`.
    pub fn open(&self, path: &Path, mode: Mode) -> StoreResult<Box<dyn Database>> {
        match self {
            BackendKind::Ordered => Ok(Box::new(OrderedStore::open(path, mode)?)),
            BackendKind::Hash => Ok(Box::new(HashStore::open(path, mode)?)),
        }
    }
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Ordered
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lmdb" => Ok(BackendKind::Ordered),
            "leveldb" => Ok(BackendKind::Hash),
            other => Err(format!(
                "unknown backend '{}', expected 'lmdb' or 'leveldb'",
                other
            )),
        }
    }
}
