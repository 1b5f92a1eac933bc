//! Read-cursor over a borrowed byte slice.
//!
//! Follows a "prepare vs. execute" split: every method here is read-only
//! and advances `pos` only on a
//! successful, complete read. A short read leaves `pos` untouched so the
//! decoder can retry the whole frame from its original offset once more
//! bytes arrive.

use super::varint::{
    read_signed_varint32, read_signed_varint64, read_varint32, read_varint64,
};
use crate::errors::ProtocolError;

/// A non-consuming-on-failure cursor over `&[u8]`.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Wraps `data`, starting at offset 0.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Reads a single byte, or `None` if the buffer is exhausted.
    pub fn read_u8(&mut self) -> Option<u8> {
        let byte = *self.rest().first()?;
        self.pos += 1;
        Some(byte)
    }

    /// Reads `n` raw bytes, or `None` if fewer than `n` remain.
    pub fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Some(slice)
    }

    /// Reads a little-endian `u16`.
    pub fn read_u16_le(&mut self) -> Option<u16> {
        let bytes = self.read_bytes(2)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a little-endian `u32`.
    pub fn read_u32_le(&mut self) -> Option<u32> {
        let bytes = self.read_bytes(4)?;
        Some(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads a little-endian `u64`.
    pub fn read_u64_le(&mut self) -> Option<u64> {
        let bytes = self.read_bytes(8)?;
        Some(u64::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads a little-endian `f32`.
    pub fn read_f32_le(&mut self) -> Option<f32> {
        let bytes = self.read_bytes(4)?;
        Some(f32::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads an unsigned varint as `u32`.
    ///
    /// `Ok(None)` means the buffer doesn't yet hold a complete varint.
    pub fn read_varint_u32(&mut self) -> Result<Option<u32>, ProtocolError> {
        let (n, value) = read_varint32(self.rest())?;
        if n == 0 {
            return Ok(None);
        }
        self.pos += n;
        Ok(Some(value))
    }

    /// Reads an unsigned varint as `u64`.
    pub fn read_varint_u64(&mut self) -> Result<Option<u64>, ProtocolError> {
        let (n, value) = read_varint64(self.rest())?;
        if n == 0 {
            return Ok(None);
        }
        self.pos += n;
        Ok(Some(value))
    }

    /// Reads a zigzag varint as `i32`.
    pub fn read_signed_varint_i32(&mut self) -> Result<Option<i32>, ProtocolError> {
        let (n, value) = read_signed_varint32(self.rest())?;
        if n == 0 {
            return Ok(None);
        }
        self.pos += n;
        Ok(Some(value))
    }

    /// Reads a zigzag varint as `i64`.
    pub fn read_signed_varint_i64(&mut self) -> Result<Option<i64>, ProtocolError> {
        let (n, value) = read_signed_varint64(self.rest())?;
        if n == 0 {
            return Ok(None);
        }
        self.pos += n;
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_varint_leaves_position_untouched() {
        let mut buf = Vec::new();
        super::super::varint::write_varint64(&mut buf, 16_384);
        let mut reader = ByteReader::new(&buf[..2]);
        assert_eq!(reader.read_varint_u64().unwrap(), None);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn fixed_width_reads_advance_position() {
        let buf = [0xAAu8, 0xBB, 0x01, 0x00, 0x00, 0x00];
        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.read_u8(), Some(0xAA));
        assert_eq!(reader.read_u8(), Some(0xBB));
        assert_eq!(reader.read_u32_le(), Some(1));
        assert_eq!(reader.position(), 6);
        assert_eq!(reader.read_u8(), None);
    }
}
