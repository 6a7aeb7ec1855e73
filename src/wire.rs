//! Little-endian primitives shared by the datum and store frame codecs

use std::io::{self, Read};

/// Appends `bytes` with a u32 length prefix.
///
/// Returns the offending length when it does not fit in a u32.
pub(crate) fn write_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), usize> {
    let len = u32::try_from(bytes.len()).map_err(|_| bytes.len())?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

pub(crate) fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub(crate) fn read_f32<R: Read>(reader: &mut R) -> io::Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

/// Reads a u32 length prefix followed by that many bytes.
pub(crate) fn read_prefixed<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let len = read_u32(reader)? as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
