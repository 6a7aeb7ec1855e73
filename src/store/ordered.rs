//! Ordered store: a single append-only frame log with a key-ordered index
//!
//! Layout: `<dir>/data.log`.
//!
//! - A commit appends the transaction's PUT frames and one COMMIT frame in a
//!   single write, then fsyncs.
//! - On open, frames after the last COMMIT are an uncommitted tail and are
//!   ignored. A file that ends inside a frame is treated the same way.
//! - A complete frame that fails its checksum is corruption.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::backend::{Database, Mode, Transaction};
use super::errors::{StoreError, StoreResult};
use super::frame::{read_frame_at, Frame, FrameReader, Next};

/// Key-ordered record store
pub struct OrderedStore {
    dir: PathBuf,
    log_path: PathBuf,
    mode: Mode,
    /// Append handle; `None` for read-only handles
    file: Option<File>,
    /// End of the committed log
    committed_len: u64,
    /// key -> offset of its latest committed PUT frame
    index: BTreeMap<Vec<u8>, u64>,
    next_txn_id: u64,
}

impl OrderedStore {
    pub const LOG_FILE: &'static str = "data.log";

    pub fn open(dir: &Path, mode: Mode) -> StoreResult<Self> {
        let log_path = dir.join(Self::LOG_FILE);
        match mode {
            Mode::New => {
                super::create_store_dir(dir)?;
                let file = OpenOptions::new()
                    .create_new(true)
                    .append(true)
                    .open(&log_path)
                    .map_err(|e| {
                        StoreError::io_error(
                            format!("Failed to create log: {}", log_path.display()),
                            e,
                        )
                    })?;

                Ok(Self {
                    dir: dir.to_path_buf(),
                    log_path,
                    mode,
                    file: Some(file),
                    committed_len: 0,
                    index: BTreeMap::new(),
                    next_txn_id: 1,
                })
            }
            Mode::Read => {
                if !log_path.is_file() {
                    return Err(StoreError::not_found(dir));
                }
                let (index, committed_len, last_txn_id) = Self::scan(&log_path)?;

                Ok(Self {
                    dir: dir.to_path_buf(),
                    log_path,
                    mode,
                    file: None,
                    committed_len,
                    index,
                    next_txn_id: last_txn_id + 1,
                })
            }
        }
    }

    /// Replays the log, applying only fully committed transactions.
    fn scan(log_path: &Path) -> StoreResult<(BTreeMap<Vec<u8>, u64>, u64, u64)> {
        let mut reader = FrameReader::open(log_path)?;
        let mut index = BTreeMap::new();
        let mut pending: Vec<(Vec<u8>, u64)> = Vec::new();
        let mut committed_len = 0;
        let mut last_txn_id = 0;

        loop {
            match reader.read_next()? {
                Next::Frame(offset, Frame::Put { key, .. }) => pending.push((key, offset)),
                Next::Frame(offset, Frame::Commit { txn_id, entries }) => {
                    if entries as usize != pending.len() {
                        return Err(StoreError::corruption_at(
                            log_path,
                            offset,
                            format!(
                                "commit {} declares {} entries, found {}",
                                txn_id,
                                entries,
                                pending.len()
                            ),
                        ));
                    }
                    index.extend(pending.drain(..));
                    last_txn_id = txn_id;
                    committed_len = reader.offset();
                }
                Next::Eof | Next::TornTail(_) => break,
            }
        }

        Ok((index, committed_len, last_txn_id))
    }
}

impl Database for OrderedStore {
    fn path(&self) -> &Path {
        &self.dir
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn new_transaction(&mut self) -> StoreResult<Transaction> {
        if self.file.is_none() {
            return Err(StoreError::read_only(&self.dir));
        }
        let txn = Transaction::new(self.next_txn_id);
        self.next_txn_id += 1;
        Ok(txn)
    }

    fn commit(&mut self, txn: Transaction) -> StoreResult<usize> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| StoreError::read_only(&self.dir))?;

        if txn.is_empty() {
            return Ok(0);
        }

        let entries = u32::try_from(txn.len()).map_err(|_| {
            StoreError::invalid_argument(format!("transaction too large: {} puts", txn.len()))
        })?;

        let mut buf = Vec::with_capacity(txn.pending_bytes() + txn.len() * 32);
        let mut offsets = Vec::with_capacity(txn.len());
        for (key, value) in txn.puts() {
            offsets.push(self.committed_len + buf.len() as u64);
            Frame::encode_put(&mut buf, key, value)?;
        }
        Frame::encode_commit(&mut buf, txn.id(), entries)?;

        file.write_all(&buf)
            .and_then(|_| file.sync_data())
            .map_err(|e: io::Error| {
                StoreError::commit_failed(
                    txn.id(),
                    format!("Failed to append to {}", self.log_path.display()),
                    e,
                )
            })?;

        self.committed_len += buf.len() as u64;
        for ((key, _), offset) in txn.puts().iter().zip(offsets) {
            self.index.insert(key.clone(), offset);
        }

        Ok(txn.len())
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let Some(&offset) = self.index.get(key) else {
            return Ok(None);
        };
        match read_frame_at(&self.log_path, offset)? {
            Frame::Put { key: stored, value } if stored == key => Ok(Some(value)),
            _ => Err(StoreError::corruption_at(
                &self.log_path,
                offset,
                "index points at a frame for another key",
            )),
        }
    }

    fn keys(&self) -> Vec<Vec<u8>> {
        self.index.keys().cloned().collect()
    }
}
