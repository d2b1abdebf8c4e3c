//! Byte-level primitives for the persisted form.
//!
//! - Variable-length integers (LEB128-style VarInt)
//! - Fixed-width little-endian integers
//! - Length-prefixed byte slices
//!
//! All decoding goes through [`Reader`], which never reads past the end of
//! its buffer and reports the offset of any truncation.

use crate::error::ParseError;

/// Append `value` as a variable-length integer.
///
/// Uses 1-10 bytes depending on the value:
/// - 0-127: 1 byte
/// - 128-16383: 2 bytes
/// - etc.
pub fn put_varint(mut value: u64, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Number of bytes `put_varint` emits for `value`.
pub fn varint_size(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let bits = 64 - value.leading_zeros() as usize;
    (bits + 6) / 7
}

/// Append a varint length followed by `data`.
pub fn put_bytes(data: &[u8], buf: &mut Vec<u8>) {
    put_varint(data.len() as u64, buf);
    buf.extend_from_slice(data);
}

/// Bounds-checked cursor over a byte slice.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        if n > self.remaining() {
            return Err(ParseError::Truncated {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, ParseError> {
        Ok(self.take(1)?[0])
    }

    pub fn u32_le(&mut self) -> Result<u32, ParseError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn u64_le(&mut self) -> Result<u64, ParseError> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_le_bytes(arr))
    }

    pub fn varint(&mut self) -> Result<u64, ParseError> {
        let start = self.pos;
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.u8()?;
            if shift == 63 && byte > 1 {
                return Err(ParseError::VarintOverflow(start));
            }
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift > 63 {
                return Err(ParseError::VarintOverflow(start));
            }
        }
    }

    /// Read a varint length and then that many bytes.
    pub fn bytes(&mut self) -> Result<&'a [u8], ParseError> {
        let len = self.varint()?;
        let len = usize::try_from(len).map_err(|_| ParseError::Truncated {
            offset: self.pos,
            needed: usize::MAX,
        })?;
        self.take(len)
    }
}
