//! CRC32 checksums for datum records and store frames
//!
//! Uses CRC32 (IEEE polynomial). Any mismatch on read is corruption.

use crc32fast::Hasher;

/// Computes a CRC32 checksum over the provided bytes.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Verifies that `data` hashes to `expected`.
pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}
