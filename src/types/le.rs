//! Bounds-checked little-endian field access.

use crate::error::{EseError, Result};

/// Borrow `len` bytes at `offset`, failing if the buffer is too short
pub fn slice<'a>(bytes: &'a [u8], offset: usize, len: usize, what: &'static str) -> Result<&'a [u8]> {
    offset
        .checked_add(len)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| EseError::truncated(what, offset, len, bytes.len()))
}

/// Read one byte
pub fn read_u8(bytes: &[u8], offset: usize, what: &'static str) -> Result<u8> {
    Ok(slice(bytes, offset, 1, what)?[0])
}

/// Read a little-endian u16
pub fn read_u16(bytes: &[u8], offset: usize, what: &'static str) -> Result<u16> {
    let b = slice(bytes, offset, 2, what)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

/// Read a little-endian u32
pub fn read_u32(bytes: &[u8], offset: usize, what: &'static str) -> Result<u32> {
    let b = slice(bytes, offset, 4, what)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Read a little-endian u64
pub fn read_u64(bytes: &[u8], offset: usize, what: &'static str) -> Result<u64> {
    let b = slice(bytes, offset, 8, what)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(b);
    Ok(u64::from_le_bytes(raw))
}
