//! # band-trie
//!
//! A banded prefix-trie index for approximate matching of fingerprint hashes.
//!
//! Each item is described by `R` fixed-length bit-strings ("bands"), for
//! example the chunks of a perceptual or locality-sensitive hash. Every band
//! has its own binary trie of height `H`. A query matches an item when the
//! query's band fingerprints equal the item's in at least `T` bands.
//!
//! ## Example
//!
//! ```rust
//! use band_trie::{IndexConfig, TrieSearch};
//!
//! let search: TrieSearch<u64> = TrieSearch::new(IndexConfig::new(2, 4, 2)).unwrap();
//! search.insert_str(1, &["1010", "0101"]).unwrap();
//!
//! assert_eq!(search.search_str(&["1010", "0101"]).unwrap(), vec![1]);
//! assert!(search.search_str(&["1010", "1111"]).unwrap().is_empty());
//!
//! let saved = search.get_persisted_form();
//! search.load_persisted_form(&saved).unwrap();
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

mod bits;
mod config;
pub mod encoding;
mod error;
mod id;
mod index;
mod persist;
mod search;
mod trie;
mod vote;

pub use bits::{BitString, MAX_WIDTH};
pub use config::IndexConfig;
pub use error::{ConfigError, Error, ParseError, Result, ValidationError};
pub use id::ItemId;
pub use index::BandedIndex;
pub use persist::{decode_index, encode_index};
pub use search::TrieSearch;
pub use trie::{BandTrie, Iter};
pub use vote::vote;


#[cfg(test)]
mod proptests;
