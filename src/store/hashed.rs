//! Hash store: immutable per-commit tables behind an atomically replaced manifest
//!
//! Layout:
//!
//! ```text
//! <dir>/MANIFEST        JSON list of committed tables
//! <dir>/000001.tbl      PUT frames + one COMMIT frame
//! <dir>/000002.tbl
//! ```
//!
//! A commit writes and fsyncs a new table, then publishes it by rewriting
//! `MANIFEST` through a temp file and rename. A table that never made it into
//! the manifest was not committed and is ignored on open.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::backend::{Database, Mode, Transaction};
use super::errors::{StoreError, StoreResult};
use super::frame::{read_frame_at, Frame, FrameReader, Next};
use crate::checksum::{compute_checksum, verify_checksum};

const MANIFEST_FILE: &str = "MANIFEST";
const MANIFEST_TEMP_FILE: &str = "MANIFEST.tmp";
const FORMAT_VERSION: u8 = 1;

/// One committed table as recorded in the manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableEntry {
    pub id: u32,
    /// Number of puts in the table
    pub entries: u32,
    /// CRC32 of the whole table file
    pub checksum: u32,
}

/// Contents of `MANIFEST`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableManifest {
    pub format_version: u8,
    /// RFC3339 time of the last publish
    pub updated_at: String,
    pub tables: Vec<TableEntry>,
}

impl TableManifest {
    fn empty() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            updated_at: Utc::now().to_rfc3339(),
            tables: Vec::new(),
        }
    }

    fn read(dir: &Path) -> StoreResult<Self> {
        let path = dir.join(MANIFEST_FILE);
        let contents = fs::read_to_string(&path)
            .map_err(|e| StoreError::io_error(format!("Failed to read {}", path.display()), e))?;
        let manifest: TableManifest = serde_json::from_str(&contents).map_err(|e| {
            StoreError::corruption(format!("Invalid manifest {}: {}", path.display(), e))
        })?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(StoreError::corruption(format!(
                "Unsupported manifest version {} in {}",
                manifest.format_version,
                path.display()
            )));
        }
        Ok(manifest)
    }

    /// Replaces `<dir>/MANIFEST` atomically: temp file, fsync, rename, fsync dir.
    fn publish(&self, dir: &Path) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            StoreError::invalid_argument(format!("Failed to serialize manifest: {}", e))
        })?;

        let temp = dir.join(MANIFEST_TEMP_FILE);
        let mut file = File::create(&temp)
            .map_err(|e| StoreError::io_error(format!("Failed to create {}", temp.display()), e))?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| StoreError::io_error(format!("Failed to write {}", temp.display()), e))?;
        drop(file);

        let path = dir.join(MANIFEST_FILE);
        fs::rename(&temp, &path).map_err(|e| {
            StoreError::io_error(format!("Failed to publish {}", path.display()), e)
        })?;
        super::fsync_dir(dir)
    }
}

fn table_name(id: u32) -> String {
    format!("{:06}.tbl", id)
}

/// Hash-indexed record store
pub struct HashStore {
    dir: PathBuf,
    mode: Mode,
    manifest: TableManifest,
    /// key -> (table id, offset of its PUT frame); later tables win
    index: HashMap<Vec<u8>, (u32, u64)>,
    next_txn_id: u64,
}

impl HashStore {
    pub fn open(dir: &Path, mode: Mode) -> StoreResult<Self> {
        match mode {
            Mode::New => {
                super::create_store_dir(dir)?;
                let manifest = TableManifest::empty();
                manifest.publish(dir)?;

                Ok(Self {
                    dir: dir.to_path_buf(),
                    mode,
                    manifest,
                    index: HashMap::new(),
                    next_txn_id: 1,
                })
            }
            Mode::Read => {
                if !dir.join(MANIFEST_FILE).is_file() {
                    return Err(StoreError::not_found(dir));
                }
                let manifest = TableManifest::read(dir)?;
                let mut index = HashMap::new();
                let mut last_txn_id = 0;
                for table in &manifest.tables {
                    last_txn_id = Self::load_table(dir, table, &mut index)?;
                }

                Ok(Self {
                    dir: dir.to_path_buf(),
                    mode,
                    manifest,
                    index,
                    next_txn_id: last_txn_id + 1,
                })
            }
        }
    }

    /// Verifies one listed table and adds its keys to `index`.
    ///
    /// Returns the table's transaction id.
    fn load_table(
        dir: &Path,
        table: &TableEntry,
        index: &mut HashMap<Vec<u8>, (u32, u64)>,
    ) -> StoreResult<u64> {
        let path = dir.join(table_name(table.id));
        let bytes = fs::read(&path)
            .map_err(|e| StoreError::io_error(format!("Failed to read {}", path.display()), e))?;
        if !verify_checksum(&bytes, table.checksum) {
            return Err(StoreError::corruption_at(
                &path,
                0,
                format!(
                    "table checksum mismatch: computed {:08x}, recorded {:08x}",
                    compute_checksum(&bytes),
                    table.checksum
                ),
            ));
        }

        let mut reader = FrameReader::open(&path)?;
        let mut puts = Vec::new();
        loop {
            match reader.read_next()? {
                Next::Frame(offset, Frame::Put { key, .. }) => puts.push((key, offset)),
                Next::Frame(offset, Frame::Commit { txn_id, entries }) => {
                    if entries != table.entries || entries as usize != puts.len() {
                        return Err(StoreError::corruption_at(
                            &path,
                            offset,
                            format!(
                                "commit {} declares {} entries, found {}",
                                txn_id,
                                entries,
                                puts.len()
                            ),
                        ));
                    }
                    if !matches!(reader.read_next()?, Next::Eof) {
                        return Err(StoreError::corruption_at(
                            &path,
                            reader.offset(),
                            "data after commit frame",
                        ));
                    }
                    for (key, offset) in puts {
                        index.insert(key, (table.id, offset));
                    }
                    return Ok(txn_id);
                }
                Next::Eof | Next::TornTail(_) => {
                    return Err(StoreError::corruption_at(
                        &path,
                        reader.offset(),
                        "listed table has no commit frame",
                    ));
                }
            }
        }
    }

    /// Tables published so far
    pub fn tables(&self) -> &[TableEntry] {
        &self.manifest.tables
    }
}

impl Database for HashStore {
    fn path(&self) -> &Path {
        &self.dir
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn new_transaction(&mut self) -> StoreResult<Transaction> {
        if self.mode == Mode::Read {
            return Err(StoreError::read_only(&self.dir));
        }
        let txn = Transaction::new(self.next_txn_id);
        self.next_txn_id += 1;
        Ok(txn)
    }

    fn commit(&mut self, txn: Transaction) -> StoreResult<usize> {
        if self.mode == Mode::Read {
            return Err(StoreError::read_only(&self.dir));
        }
        if txn.is_empty() {
            return Ok(0);
        }

        let entries = u32::try_from(txn.len()).map_err(|_| {
            StoreError::invalid_argument(format!("transaction too large: {} puts", txn.len()))
        })?;
        let table_id = self.manifest.tables.last().map_or(1, |t| t.id + 1);

        let mut buf = Vec::with_capacity(txn.pending_bytes() + txn.len() * 32);
        let mut offsets = Vec::with_capacity(txn.len());
        for (key, value) in txn.puts() {
            offsets.push(buf.len() as u64);
            Frame::encode_put(&mut buf, key, value)?;
        }
        Frame::encode_commit(&mut buf, txn.id(), entries)?;

        let path = self.dir.join(table_name(table_id));
        let mut file = File::options()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                StoreError::commit_failed(
                    txn.id(),
                    format!("Failed to create table {}", path.display()),
                    e,
                )
            })?;
        file.write_all(&buf).and_then(|_| file.sync_all()).map_err(|e| {
            StoreError::commit_failed(
                txn.id(),
                format!("Failed to write table {}", path.display()),
                e,
            )
        })?;

        let mut next = self.manifest.clone();
        next.tables.push(TableEntry {
            id: table_id,
            entries,
            checksum: compute_checksum(&buf),
        });
        next.updated_at = Utc::now().to_rfc3339();
        next.publish(&self.dir)?;
        self.manifest = next;

        for ((key, _), offset) in txn.puts().iter().zip(offsets) {
            self.index.insert(key.clone(), (table_id, offset));
        }

        Ok(txn.len())
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let Some(&(table_id, offset)) = self.index.get(key) else {
            return Ok(None);
        };
        let path = self.dir.join(table_name(table_id));
        match read_frame_at(&path, offset)? {
            Frame::Put { key: stored, value } if stored == key => Ok(Some(value)),
            _ => Err(StoreError::corruption_at(
                &path,
                offset,
                "index points at a frame for another key",
            )),
        }
    }

    fn keys(&self) -> Vec<Vec<u8>> {
        let mut keys: Vec<Vec<u8>> = self.index.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn commit_pairs(store: &mut HashStore, pairs: &[(&str, &str)]) {
        let mut txn = store.new_transaction().unwrap();
        for (k, v) in pairs {
            txn.put(*k, v.as_bytes());
        }
        store.commit(txn).unwrap();
    }

    #[test]
    fn test_each_commit_publishes_a_table() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("images");
        let mut store = HashStore::open(&dir, Mode::New).unwrap();

        commit_pairs(&mut store, &[("a", "1"), ("b", "2")]);
        commit_pairs(&mut store, &[("c", "3")]);

        assert!(dir.join("000001.tbl").is_file());
        assert!(dir.join("000002.tbl").is_file());
        assert!(!dir.join(MANIFEST_TEMP_FILE).exists());

        let manifest = TableManifest::read(&dir).unwrap();
        assert_eq!(manifest.tables.len(), 2);
        assert_eq!(manifest.tables[0].entries, 2);
        assert_eq!(manifest.tables[1].entries, 1);
    }

    #[test]
    fn test_reopen_rebuilds_index() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("db");
        {
            let mut store = HashStore::open(&dir, Mode::New).unwrap();
            commit_pairs(&mut store, &[("k2", "two"), ("k1", "one")]);
            commit_pairs(&mut store, &[("k1", "uno")]);
        }

        let store = HashStore::open(&dir, Mode::Read).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.keys(), vec![b"k1".to_vec(), b"k2".to_vec()]);
        assert_eq!(store.get(b"k1").unwrap(), Some(b"uno".to_vec()));
        assert_eq!(store.get(b"k2").unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn test_unlisted_table_is_ignored() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("db");
        {
            let mut store = HashStore::open(&dir, Mode::New).unwrap();
            commit_pairs(&mut store, &[("k1", "v1")]);
        }

        // A table written before a crash that never reached the manifest
        let mut orphan = Vec::new();
        Frame::encode_put(&mut orphan, b"k9", b"v9").unwrap();
        Frame::encode_commit(&mut orphan, 2, 1).unwrap();
        fs::write(dir.join(table_name(2)), orphan).unwrap();

        let store = HashStore::open(&dir, Mode::Read).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(b"k9").unwrap(), None);
    }

    #[test]
    fn test_damaged_table_is_corruption() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("db");
        {
            let mut store = HashStore::open(&dir, Mode::New).unwrap();
            commit_pairs(&mut store, &[("key", "value")]);
        }

        let table = dir.join(table_name(1));
        let mut bytes = fs::read(&table).unwrap();
        bytes[9] ^= 0x01;
        fs::write(&table, bytes).unwrap();

        let err = HashStore::open(&dir, Mode::Read).err().unwrap();
        assert!(err.is_fatal());
        assert_eq!(err.code().code(), "PAIRDB_STORE_CORRUPTION");
    }

    #[test]
    fn test_existing_target_refused() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("db");
        drop(HashStore::open(&dir, Mode::New).unwrap());

        let err = HashStore::open(&dir, Mode::New).err().unwrap();
        assert_eq!(err.code().code(), "PAIRDB_STORE_EXISTS");
    }

    #[test]
    fn test_missing_store_not_found() {
        let temp = TempDir::new().unwrap();
        let err = HashStore::open(&temp.path().join("nope"), Mode::Read)
            .err()
            .unwrap();
        assert_eq!(err.code().code(), "PAIRDB_STORE_NOT_FOUND");
    }
}
