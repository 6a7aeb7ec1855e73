//! On-disk frame format shared by both store engines
//!
//! ```text
//! +------------------+
//! | Frame Length     | (u32 LE) total length including this field and checksum
//! +------------------+
//! | Kind             | (u8: 1 = PUT, 2 = COMMIT)
//! +------------------+
//! | Body             | PUT:    key (u32 len + bytes), value (u32 len + bytes)
//! |                  | COMMIT: txn id (u64), entry count (u32)
//! +------------------+
//! | Checksum         | (u32 LE) CRC32 over every preceding byte of the frame
//! +------------------+
//! ```
//!
//! A transaction is its PUT frames followed by exactly one COMMIT frame.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::errors::{StoreError, StoreResult};
use crate::checksum::compute_checksum;
use crate::wire;

const KIND_PUT: u8 = 1;
const KIND_COMMIT: u8 = 2;

/// Length + kind + checksum
const FRAME_OVERHEAD: u64 = 4 + 1 + 4;

/// Smallest valid frame: a PUT with empty key and value
const MIN_FRAME_SIZE: u64 = FRAME_OVERHEAD + 4 + 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Put { key: Vec<u8>, value: Vec<u8> },
    Commit { txn_id: u64, entries: u32 },
}

impl Frame {
    /// Appends a PUT frame to `buf`.
    pub fn encode_put(buf: &mut Vec<u8>, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let start = Self::begin(buf, KIND_PUT);
        wire::write_prefixed(buf, key).map_err(|len| {
            StoreError::invalid_argument(format!("key too large: {} bytes", len))
        })?;
        wire::write_prefixed(buf, value).map_err(|len| {
            StoreError::invalid_argument(format!("value too large: {} bytes", len))
        })?;
        Self::seal(buf, start)
    }

    /// Appends a COMMIT frame to `buf`.
    pub fn encode_commit(buf: &mut Vec<u8>, txn_id: u64, entries: u32) -> StoreResult<()> {
        let start = Self::begin(buf, KIND_COMMIT);
        buf.extend_from_slice(&txn_id.to_le_bytes());
        buf.extend_from_slice(&entries.to_le_bytes());
        Self::seal(buf, start)
    }

    fn begin(buf: &mut Vec<u8>, kind: u8) -> usize {
        let start = buf.len();
        buf.extend_from_slice(&[0u8; 4]);
        buf.push(kind);
        start
    }

    fn seal(buf: &mut Vec<u8>, start: usize) -> StoreResult<()> {
        let total = buf.len() - start + 4;
        let frame_length = u32::try_from(total).map_err(|_| {
            buf.truncate(start);
            StoreError::invalid_argument(format!("frame too large: {} bytes", total))
        })?;
        buf[start..start + 4].copy_from_slice(&frame_length.to_le_bytes());
        let checksum = compute_checksum(&buf[start..]);
        buf.extend_from_slice(&checksum.to_le_bytes());
        Ok(())
    }

    /// Decodes exactly one frame, verifying its checksum.
    pub fn decode(data: &[u8]) -> Result<Self, String> {
        if (data.len() as u64) < FRAME_OVERHEAD {
            return Err(format!("frame too short: {} bytes", data.len()));
        }

        let checksum_offset = data.len() - 4;
        let stored = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed = compute_checksum(&data[..checksum_offset]);
        if computed != stored {
            return Err(format!(
                "checksum mismatch: computed {:08x}, stored {:08x}",
                computed, stored
            ));
        }

        let mut cursor = Cursor::new(&data[5..checksum_offset]);
        let frame = match data[4] {
            KIND_PUT => {
                let key = wire::read_prefixed(&mut cursor).map_err(|e| e.to_string())?;
                let value = wire::read_prefixed(&mut cursor).map_err(|e| e.to_string())?;
                Frame::Put { key, value }
            }
            KIND_COMMIT => {
                let txn_id = wire::read_u64(&mut cursor).map_err(|e| e.to_string())?;
                let entries = wire::read_u32(&mut cursor).map_err(|e| e.to_string())?;
                Frame::Commit { txn_id, entries }
            }
            other => return Err(format!("unknown frame kind {}", other)),
        };

        if cursor.position() as usize != checksum_offset - 5 {
            return Err("trailing bytes in frame body".to_string());
        }

        Ok(frame)
    }
}

/// Result of reading the next frame from a file.
#[derive(Debug)]
pub enum Next {
    /// A valid frame and the byte offset it starts at
    Frame(u64, Frame),
    /// Clean end of file
    Eof,
    /// The file ends inside a frame starting at this offset
    TornTail(u64),
}

/// Sequential frame reader with checksum validation.
pub struct FrameReader {
    path: PathBuf,
    reader: BufReader<File>,
    offset: u64,
    file_size: u64,
}

impl FrameReader {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let file = File::open(path).map_err(|e| {
            StoreError::io_error(format!("Failed to open {}", path.display()), e)
        })?;
        let file_size = file
            .metadata()
            .map_err(|e| StoreError::io_error("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            offset: 0,
            file_size,
        })
    }

    /// Offset just past the last frame read
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads the next frame.
    ///
    /// A frame cut short by end of file is reported as [`Next::TornTail`];
    /// a complete frame that fails validation is corruption.
    pub fn read_next(&mut self) -> StoreResult<Next> {
        if self.offset >= self.file_size {
            return Ok(Next::Eof);
        }

        let remaining = self.file_size - self.offset;
        if remaining < 4 {
            return Ok(Next::TornTail(self.offset));
        }

        let mut len_buf = [0u8; 4];
        self.reader
            .read_exact(&mut len_buf)
            .map_err(|e| StoreError::io_error(format!("Failed to read {}", self.path.display()), e))?;
        let frame_length = u32::from_le_bytes(len_buf) as u64;

        if frame_length < MIN_FRAME_SIZE {
            return Err(StoreError::corruption_at(
                &self.path,
                self.offset,
                format!("invalid frame length {}", frame_length),
            ));
        }
        if frame_length > remaining {
            return Ok(Next::TornTail(self.offset));
        }

        let mut frame_buf = vec![0u8; frame_length as usize];
        frame_buf[..4].copy_from_slice(&len_buf);
        self.reader
            .read_exact(&mut frame_buf[4..])
            .map_err(|e| StoreError::io_error(format!("Failed to read {}", self.path.display()), e))?;

        let frame = Frame::decode(&frame_buf)
            .map_err(|reason| StoreError::corruption_at(&self.path, self.offset, reason))?;

        let start = self.offset;
        self.offset += frame_length;
        Ok(Next::Frame(start, frame))
    }
}

/// Reads the single frame starting at `offset` in `path`.
pub fn read_frame_at(path: &Path, offset: u64) -> StoreResult<Frame> {
    let mut file = File::open(path)
        .map_err(|e| StoreError::io_error(format!("Failed to open {}", path.display()), e))?;
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| StoreError::io_error(format!("Failed to seek to offset {}", offset), e))?;

    let mut len_buf = [0u8; 4];
    file.read_exact(&mut len_buf)
        .map_err(|e| StoreError::corruption_at(path, offset, format!("no frame: {}", e)))?;
    let frame_length = u32::from_le_bytes(len_buf) as usize;
    if (frame_length as u64) < MIN_FRAME_SIZE {
        return Err(StoreError::corruption_at(
            path,
            offset,
            format!("invalid frame length {}", frame_length),
        ));
    }

    let mut frame_buf = vec![0u8; frame_length];
    frame_buf[..4].copy_from_slice(&len_buf);
    file.read_exact(&mut frame_buf[4..])
        .map_err(|e| StoreError::corruption_at(path, offset, format!("truncated frame: {}", e)))?;

    Frame::decode(&frame_buf).map_err(|reason| StoreError::corruption_at(path, offset, reason))
}
