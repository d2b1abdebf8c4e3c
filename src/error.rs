//! Error types for band-trie.

use thiserror::Error;

/// Rejected input to `insert` / `search`. No state is mutated when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected {expected} bit-strings, got {got}")]
    BandCount { expected: usize, got: usize },

    #[error("bit-string for band {band} has length {got}, expected {expected}")]
    BitLength {
        band: usize,
        expected: usize,
        got: usize,
    },

    #[error("invalid symbol {symbol:?} at position {position} (only '0' and '1' are allowed)")]
    InvalidSymbol { position: usize, symbol: char },

    #[error("fingerprint width {0} is outside 1..=64")]
    Width(usize),
}

/// Malformed persisted index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected end of input at byte {offset} (needed {needed} more)")]
    Truncated { offset: usize, needed: usize },

    #[error("bad magic header")]
    BadMagic,

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    #[error("band {band} declares {len} bytes but only {available} remain")]
    LengthOutOfRange {
        band: usize,
        len: u64,
        available: usize,
    },

    #[error("persisted index declares zero bands")]
    NoBands,

    #[error("band count mismatch: expected {expected}, found {found}")]
    BandCountMismatch { expected: usize, found: usize },

    #[error("height mismatch: expected {expected}, found {found}")]
    HeightMismatch { expected: u8, found: u8 },

    #[error("invalid height {0}")]
    InvalidHeight(u8),

    #[error("corrupt tree in band {band}: {reason}")]
    CorruptTree { band: usize, reason: &'static str },

    #[error("invalid id encoding: {0}")]
    InvalidId(&'static str),

    #[error("varint overflows 64 bits at byte {0}")]
    VarintOverflow(usize),

    #[error("{0} trailing bytes after last band")]
    TrailingBytes(usize),
}

/// Invalid [`IndexConfig`](crate::IndexConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("band count must be at least 1")]
    NoBands,

    #[error("trie height {0} is outside 1..=64")]
    Height(u8),

    #[error("threshold {threshold} is outside 1..={bands}")]
    Threshold { threshold: usize, bands: usize },
}

/// Top-level error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
