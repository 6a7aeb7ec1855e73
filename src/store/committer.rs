//! Batched committer
//!
//! Wraps one store and bounds every transaction to `batch_size` puts:
//! - Puts are buffered in the open transaction, in call order
//! - When the running count reaches a multiple of `batch_size` the
//!   transaction is committed and a fresh one begun
//! - [`BatchedCommitter::finish`] commits the remainder, if any
//!
//! Batch size is fixed at construction. There is no time-based flushing and
//! no retry; any backend error is returned to the caller as is.

use std::path::Path;

use super::backend::{BackendKind, Database, Mode, Transaction};
use super::errors::{StoreError, StoreResult};
use crate::observability::{log_event_with_fields, Event};

/// Records per transaction unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Totals reported when a committer finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitStats {
    /// Puts accepted over the committer's lifetime
    pub records: usize,
    /// Transactions committed
    pub commits: usize,
    /// Size of the last committed transaction (0 if nothing was committed)
    pub last_batch: usize,
}

pub struct BatchedCommitter {
    db: Box<dyn Database>,
    batch_size: usize,
    txn: Transaction,
    stats: CommitStats,
}

impl BatchedCommitter {
    /// Wraps an open store and begins the first transaction.
    pub fn new(db: Box<dyn Database>, batch_size: usize) -> StoreResult<Self> {
        check_batch_size(batch_size)?;
        Self::begin(db, batch_size)
    }

    /// Creates a fresh store of `kind` at `path` and wraps it. A zero batch
    /// size is refused before anything is created on disk.
    pub fn open(kind: BackendKind, path: &Path, batch_size: usize) -> StoreResult<Self> {
        check_batch_size(batch_size)?;
        let db = kind.open(path, Mode::New)?;
        Self::begin(db, batch_size)
    }

    fn begin(mut db: Box<dyn Database>, batch_size: usize) -> StoreResult<Self> {
        let txn = db.new_transaction()?;
        Ok(Self {
            db,
            batch_size,
            txn,
            stats: CommitStats::default(),
        })
    }

    /// Buffers one put. Returns true if this put completed a batch and the
    /// batch was committed.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> StoreResult<bool> {
        self.txn.put(key, value);
        self.stats.records += 1;

        if self.stats.records % self.batch_size != 0 {
            return Ok(false);
        }

        let full = std::mem::replace(&mut self.txn, Transaction::new(0));
        self.commit(full)?;
        self.txn = self.db.new_transaction()?;
        Ok(true)
    }

    /// Commits the final partial batch and closes the store.
    pub fn finish(mut self) -> StoreResult<CommitStats> {
        if !self.txn.is_empty() {
            let last = std::mem::replace(&mut self.txn, Transaction::new(0));
            self.commit(last)?;
        }
        Ok(self.stats)
    }

    fn commit(&mut self, txn: Transaction) -> StoreResult<()> {
        let committed = self.db.commit(txn)?;
        self.stats.commits += 1;
        self.stats.last_batch = committed;

        let store = self.db.path().display().to_string();
        let batch = committed.to_string();
        let processed = self.stats.records.to_string();
        log_event_with_fields(
            Event::BatchCommitted,
            &[
                ("store", store.as_str()),
                ("batch", batch.as_str()),
                ("processed", processed.as_str()),
            ],
        );
        Ok(())
    }

    /// Puts buffered in the open transaction
    pub fn pending(&self) -> usize {
        self.txn.len()
    }

    /// Running totals so far
    pub fn stats(&self) -> CommitStats {
        self.stats
    }

    pub fn path(&self) -> &Path {
        self.db.path()
    }
}

fn check_batch_size(batch_size: usize) -> StoreResult<()> {
    if batch_size == 0 {
        return Err(StoreError::invalid_argument("batch size must be at least 1"));
    }
    Ok(())
}
