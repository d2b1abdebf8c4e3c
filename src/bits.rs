//! Fixed-length bit-string fingerprints.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Longest fingerprint a single band can hold.
pub const MAX_WIDTH: usize = 64;

/// A validated bit-string of up to 64 bits, read most significant bit first.
///
/// Bit `0` is the first character of the textual form, so `"100"` has
/// `bit(0) == true`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BitString {
    /// Right-aligned: the last bit of the string is the LSB.
    bits: u64,
    len: u8,
}

impl BitString {
    /// Parse a string over the alphabet `{'0', '1'}`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let mut bits = 0u64;
        let mut len = 0usize;
        for (position, symbol) in s.chars().enumerate() {
            let bit = match symbol {
                '0' => 0,
                '1' => 1,
                _ => return Err(ValidationError::InvalidSymbol { position, symbol }),
            };
            if len == MAX_WIDTH {
                return Err(ValidationError::Width(s.chars().count()));
            }
            bits = (bits << 1) | bit;
            len += 1;
        }
        Ok(Self {
            bits,
            len: len as u8,
        })
    }

    /// Take the low `width` bits of `value`. Higher bits are ignored.
    pub fn from_u64(value: u64, width: usize) -> Result<Self, ValidationError> {
        if width > MAX_WIDTH {
            return Err(ValidationError::Width(width));
        }
        let bits = if width == MAX_WIDTH {
            value
        } else {
            value & ((1u64 << width) - 1)
        };
        Ok(Self {
            bits,
            len: width as u8,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit at `index`, counted from the start of the string.
    #[inline]
    pub fn bit(&self, index: usize) -> bool {
        debug_assert!(index < self.len());
        (self.bits >> (self.len() - 1 - index)) & 1 == 1
    }

    /// Iterate bits from first to last.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len()).map(move |i| self.bit(i))
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.bits
    }
}

impl FromStr for BitString {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitString({self})")
    }
}
