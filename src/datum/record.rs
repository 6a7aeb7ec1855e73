//! Datum: the serialized unit stored under every record key
//!
//! Wire format (all integers little-endian):
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32) total length including this field and checksum
//! +------------------+
//! | Channels         | (u32)
//! | Height           | (u32)
//! | Width            | (u32)
//! +------------------+
//! | Encoded Flag     | (u8: 0 = raw pixels, 1 = encoded file bytes)
//! +------------------+
//! | Data             | (length-prefixed bytes)
//! +------------------+
//! | Float Data       | (u32 count + f32 each)
//! +------------------+
//! | Label            | (u64) sequence index of the record
//! +------------------+
//! | Param            | (length-prefixed UTF-8) record key
//! +------------------+
//! | Checksum         | (u32) CRC32 over every preceding byte
//! +------------------+
//! ```

use std::io::Cursor;

use super::errors::{DatumError, DatumResult};
use crate::checksum::compute_checksum;
use crate::wire;

/// Smallest possible encoded datum: every variable field empty.
const MIN_DATUM_SIZE: usize = 4 + 4 + 4 + 4 + 1 + 4 + 4 + 8 + 4 + 4;

/// One stored payload, label or image variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    pub channels: u32,
    pub height: u32,
    pub width: u32,
    /// `data` holds encoded file bytes rather than raw CHW pixels
    pub encoded: bool,
    pub data: Vec<u8>,
    pub float_data: Vec<f32>,
    /// Sequence index of the record (post-shuffle)
    pub label: u64,
    /// Record key
    pub param: String,
}

impl Datum {
    /// Label payload: a 1x1x1 datum carrying the manifest label as its
    /// single float value.
    pub fn label(sequence_index: u64, key: impl Into<String>, value: f64) -> Self {
        Self {
            channels: 1,
            height: 1,
            width: 1,
            encoded: false,
            data: Vec::new(),
            float_data: vec![value as f32],
            label: sequence_index,
            param: key.into(),
        }
    }

    /// Image payload with shape and bytes from the decoder.
    pub fn image(
        channels: u32,
        height: u32,
        width: u32,
        encoded: bool,
        data: Vec<u8>,
        sequence_index: u64,
        key: impl Into<String>,
    ) -> Self {
        Self {
            channels,
            height,
            width,
            encoded,
            data,
            float_data: Vec::new(),
            label: sequence_index,
            param: key.into(),
        }
    }

    fn serialize_body(&self) -> DatumResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.data.len() + self.param.len() + 64);

        buf.extend_from_slice(&self.channels.to_le_bytes());
        buf.extend_from_slice(&self.height.to_le_bytes());
        buf.extend_from_slice(&self.width.to_le_bytes());
        buf.push(u8::from(self.encoded));

        wire::write_prefixed(&mut buf, &self.data)
            .map_err(|len| DatumError::FieldTooLarge { field: "data", len })?;

        let count = u32::try_from(self.float_data.len()).map_err(|_| DatumError::FieldTooLarge {
            field: "float_data",
            len: self.float_data.len(),
        })?;
        buf.extend_from_slice(&count.to_le_bytes());
        for value in &self.float_data {
            buf.extend_from_slice(&value.to_le_bytes());
        }

        buf.extend_from_slice(&self.label.to_le_bytes());

        wire::write_prefixed(&mut buf, self.param.as_bytes())
            .map_err(|len| DatumError::FieldTooLarge { field: "param", len })?;

        Ok(buf)
    }

    /// Serializes the datum, length-prefixed and checksummed.
    ///
    /// Fails with `FieldTooLarge` when the encoded record would not fit a
    /// u32 length.
    pub fn serialize(&self) -> DatumResult<Vec<u8>> {
        let body = self.serialize_body()?;

        let total = 4 + body.len() + 4;
        let record_length = u32::try_from(total)
            .map_err(|_| DatumError::FieldTooLarge { field: "record", len: total })?;

        let mut record = Vec::with_capacity(total);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.extend_from_slice(&body);
        let checksum = compute_checksum(&record);
        record.extend_from_slice(&checksum.to_le_bytes());

        Ok(record)
    }

    /// Parses a datum, verifying its length and checksum.
    pub fn deserialize(data: &[u8]) -> DatumResult<Self> {
        if data.len() < MIN_DATUM_SIZE {
            return Err(DatumError::Truncated(format!(
                "{} bytes, minimum is {}",
                data.len(),
                MIN_DATUM_SIZE
            )));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if record_length < MIN_DATUM_SIZE || record_length != data.len() {
            return Err(DatumError::InvalidLength(record_length));
        }

        let checksum_offset = record_length - 4;
        let stored = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed = compute_checksum(&data[..checksum_offset]);
        if computed != stored {
            return Err(DatumError::ChecksumMismatch { computed, stored });
        }

        let truncated = |e: std::io::Error| DatumError::Truncated(e.to_string());
        let mut cursor = Cursor::new(&data[4..checksum_offset]);

        let channels = wire::read_u32(&mut cursor).map_err(truncated)?;
        let height = wire::read_u32(&mut cursor).map_err(truncated)?;
        let width = wire::read_u32(&mut cursor).map_err(truncated)?;
        let encoded = wire::read_u8(&mut cursor).map_err(truncated)? != 0;
        let payload = wire::read_prefixed(&mut cursor).map_err(truncated)?;

        let count = wire::read_u32(&mut cursor).map_err(truncated)? as usize;
        if count > checksum_offset / 4 {
            return Err(DatumError::Truncated(format!("float count {} too large", count)));
        }
        let mut float_data = Vec::with_capacity(count);
        for _ in 0..count {
            float_data.push(wire::read_f32(&mut cursor).map_err(truncated)?);
        }

        let label = wire::read_u64(&mut cursor).map_err(truncated)?;
        let param = String::from_utf8(wire::read_prefixed(&mut cursor).map_err(truncated)?)
            .map_err(|_| DatumError::InvalidUtf8)?;

        Ok(Self {
            channels,
            height,
            width,
            encoded,
            data: payload,
            float_data,
            label,
            param,
        })
    }
}
