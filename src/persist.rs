//! Persisted form of a [`BandedIndex`].
//!
//! Layout (integers little endian):
//!
//! ```text
//! magic "BTRI" | version:1 | bands:u32 | height:u8 | { len:u64 | band blob } * bands
//! ```
//!
//! Each band blob is framed by its byte length. Blob contents are opaque
//! here and may contain any byte value.

use tracing::debug;

use crate::encoding::Reader;
use crate::error::ParseError;
use crate::id::ItemId;
use crate::index::BandedIndex;
use crate::trie::BandTrie;

pub const MAGIC: &[u8; 4] = b"BTRI";
pub const VERSION: u8 = 1;

const HEADER_SIZE: usize = 4 + 1 + 4 + 1;
const FRAME_LEN_SIZE: usize = 8;

/// Serialize every band of `index` into one byte buffer.
pub fn encode_index<I: ItemId>(index: &BandedIndex<I>) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + index.bands() * (FRAME_LEN_SIZE + 64));
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&(index.bands() as u32).to_le_bytes());
    out.push(index.height());

    let mut blob = Vec::new();
    for trie in index.tries() {
        blob.clear();
        trie.encode_into(&mut blob);
        out.extend_from_slice(&(blob.len() as u64).to_le_bytes());
        out.extend_from_slice(&blob);
    }

    debug!(
        bands = index.bands(),
        height = index.height(),
        bytes = out.len(),
        "encoded index"
    );
    out
}

/// Rebuild an index from [`encode_index`] output. The band count and height
/// come from the header.
pub fn decode_index<I: ItemId>(bytes: &[u8]) -> Result<BandedIndex<I>, ParseError> {
    let mut r = Reader::new(bytes);

    if r.take(MAGIC.len())? != MAGIC {
        return Err(ParseError::BadMagic);
    }
    let version = r.u8()?;
    if version != VERSION {
        return Err(ParseError::UnsupportedVersion(version));
    }
    let bands = r.u32_le()? as usize;
    if bands == 0 {
        return Err(ParseError::NoBands);
    }
    let height = r.u8()?;
    if height == 0 || usize::from(height) > crate::bits::MAX_WIDTH {
        return Err(ParseError::InvalidHeight(height));
    }

    // The header is untrusted; do not size allocations from it alone.
    let mut tries = Vec::with_capacity(bands.min(r.remaining() / FRAME_LEN_SIZE));
    for band in 0..bands {
        if r.remaining() == 0 {
            return Err(ParseError::BandCountMismatch {
                expected: bands,
                found: band,
            });
        }
        let len = r.u64_le()?;
        if len > r.remaining() as u64 {
            return Err(ParseError::LengthOutOfRange {
                band,
                len,
                available: r.remaining(),
            });
        }
        let mut blob = Reader::new(r.take(len as usize)?);
        let trie = BandTrie::decode_from(height, &mut blob, band)?;
        if blob.remaining() != 0 {
            return Err(ParseError::CorruptTree {
                band,
                reason: "trailing bytes in band blob",
            });
        }
        tries.push(trie);
    }
    if r.remaining() != 0 {
        return Err(ParseError::TrailingBytes(r.remaining()));
    }

    debug!(bands, height, bytes = bytes.len(), "decoded index");
    Ok(BandedIndex::from_tries(tries, height))
}
