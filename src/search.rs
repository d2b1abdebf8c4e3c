//! Thread-safe search façade over a [`BandedIndex`].

use parking_lot::RwLock;
use tracing::debug;

use crate::bits::BitString;
use crate::config::IndexConfig;
use crate::error::{ParseError, Result};
use crate::id::ItemId;
use crate::index::BandedIndex;
use crate::persist::{decode_index, encode_index};
use crate::vote::vote;

/// A banded index plus the vote threshold, shareable across threads.
///
/// Searches and snapshots run concurrently with each other; inserts and
/// loads are exclusive. A load swaps in a fully decoded index, so readers
/// see either the old state or the new one.
pub struct TrieSearch<I> {
    inner: RwLock<BandedIndex<I>>,
    config: IndexConfig,
}

impl<I: ItemId> TrieSearch<I> {
    /// Create an empty index. Fails if `config` is invalid.
    pub fn new(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        let index = BandedIndex::new(config.bands, config.height)?;
        Ok(Self {
            inner: RwLock::new(index),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Number of inserts performed, counting repeats.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn memory_usage(&self) -> usize {
        self.inner.read().memory_usage()
    }

    /// Store `id` under one fingerprint per band.
    pub fn insert(&self, id: I, bitstrings: &[BitString]) -> Result<()> {
        self.inner.write().insert(id, bitstrings)?;
        Ok(())
    }

    /// [`insert`](Self::insert) with textual `"0"/"1"` fingerprints.
    pub fn insert_str<S: AsRef<str>>(&self, id: I, bitstrings: &[S]) -> Result<()> {
        self.inner.write().insert_str(id, bitstrings)?;
        Ok(())
    }

    /// Ids found in at least `threshold` bands, in first-seen order.
    pub fn search(&self, bitstrings: &[BitString]) -> Result<Vec<I>> {
        let inner = self.inner.read();
        let candidates = inner.search(bitstrings)?;
        Ok(vote(&candidates, self.config.threshold))
    }

    /// [`search`](Self::search) with textual `"0"/"1"` fingerprints.
    pub fn search_str<S: AsRef<str>>(&self, bitstrings: &[S]) -> Result<Vec<I>> {
        let inner = self.inner.read();
        let candidates = inner.search_str(bitstrings)?;
        Ok(vote(&candidates, self.config.threshold))
    }

    /// Raw per-band candidate lists, before voting.
    pub fn search_candidates(&self, bitstrings: &[BitString]) -> Result<Vec<Vec<I>>> {
        let inner = self.inner.read();
        let candidates = inner.search(bitstrings)?;
        Ok(candidates.into_iter().map(<[I]>::to_vec).collect())
    }

    /// Point-in-time snapshot of the whole index.
    pub fn get_persisted_form(&self) -> Vec<u8> {
        let inner = self.inner.read();
        encode_index(&*inner)
    }

    /// Replace the whole index with a persisted one.
    ///
    /// The bytes must describe the same band count and height as this
    /// instance's configuration. On error the current index is untouched.
    pub fn load_persisted_form(&self, bytes: &[u8]) -> Result<()> {
        let index = decode_index::<I>(bytes)?;
        if index.bands() != self.config.bands {
            return Err(ParseError::BandCountMismatch {
                expected: self.config.bands,
                found: index.bands(),
            }
            .into());
        }
        if index.height() != self.config.height {
            return Err(ParseError::HeightMismatch {
                expected: self.config.height,
                found: index.height(),
            }
            .into());
        }

        let items = index.len();
        *self.inner.write() = index;
        debug!(items, bytes = bytes.len(), "loaded persisted index");
        Ok(())
    }

    /// Copy of the current index.
    pub fn snapshot(&self) -> BandedIndex<I> {
        self.inner.read().clone()
    }
}

impl<I: ItemId> Default for TrieSearch<I> {
    fn default() -> Self {
        let config = IndexConfig::default();
        Self {
            inner: RwLock::new(BandedIndex::default()),
            config,
        }
    }
}
