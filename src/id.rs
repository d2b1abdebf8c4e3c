//! Item identifiers.
//!
//! The index never interprets ids. It only needs to compare and hash them
//! while voting, and to write them into the persisted form.

use std::fmt::Debug;
use std::hash::Hash;

use crate::encoding::{put_bytes, put_varint, Reader};
use crate::error::ParseError;

/// An opaque identifier stored in trie leaves.
pub trait ItemId: Clone + Eq + Hash + Debug {
    /// Append the byte form of this id.
    fn encode(&self, buf: &mut Vec<u8>);

    /// Read one id written by [`ItemId::encode`].
    fn decode(r: &mut Reader<'_>) -> Result<Self, ParseError>;
}

impl ItemId for u64 {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_varint(*self, buf);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, ParseError> {
        r.varint()
    }
}

impl ItemId for u32 {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_varint(u64::from(*self), buf);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, ParseError> {
        u32::try_from(r.varint()?).map_err(|_| ParseError::InvalidId("u32 out of range"))
    }
}

impl ItemId for u16 {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_varint(u64::from(*self), buf);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, ParseError> {
        u16::try_from(r.varint()?).map_err(|_| ParseError::InvalidId("u16 out of range"))
    }
}

impl ItemId for i64 {
    // Zigzag keeps small negative ids short.
    fn encode(&self, buf: &mut Vec<u8>) {
        put_varint(((*self << 1) ^ (*self >> 63)) as u64, buf);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, ParseError> {
        let v = r.varint()?;
        Ok(((v >> 1) as i64) ^ -((v & 1) as i64))
    }
}

impl ItemId for String {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_bytes(self.as_bytes(), buf);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, ParseError> {
        let bytes = r.bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ParseError::InvalidId("string is not UTF-8"))
    }
}

impl ItemId for Vec<u8> {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_bytes(self, buf);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, ParseError> {
        Ok(r.bytes()?.to_vec())
    }
}
