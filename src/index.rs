//! The multi-band index: one [`BandTrie`] per band.

use tracing::trace;

use crate::bits::BitString;
use crate::error::{ConfigError, ValidationError};
use crate::id::ItemId;
use crate::trie::BandTrie;

/// `R` independent band tries sharing one height `H`.
///
/// Inserting an item writes its id into every band; searching returns the
/// raw per-band candidate lists. Thresholding is left to [`vote`](crate::vote).
#[derive(Clone, Debug)]
pub struct BandedIndex<I> {
    tries: Vec<BandTrie<I>>,
    height: u8,
}

impl<I: ItemId> BandedIndex<I> {
    /// Create an index of `bands` empty tries of the given height.
    pub fn new(bands: usize, height: u8) -> Result<Self, ConfigError> {
        if bands == 0 {
            return Err(ConfigError::NoBands);
        }
        let tries = (0..bands)
            .map(|_| BandTrie::new(height))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tries, height })
    }

    /// Rebuild from decoded tries. All tries must share `height`.
    pub(crate) fn from_tries(tries: Vec<BandTrie<I>>, height: u8) -> Self {
        debug_assert!(!tries.is_empty());
        debug_assert!(tries.iter().all(|t| t.height() == height));
        Self { tries, height }
    }

    #[inline]
    pub fn bands(&self) -> usize {
        self.tries.len()
    }

    #[inline]
    pub fn height(&self) -> u8 {
        self.height
    }

    /// Number of items inserted, counting repeats.
    #[inline]
    pub fn len(&self) -> usize {
        // Every insert adds exactly one entry per band.
        self.tries[0].entry_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn band(&self, band: usize) -> Option<&BandTrie<I>> {
        self.tries.get(band)
    }

    pub fn tries(&self) -> &[BandTrie<I>] {
        &self.tries
    }

    pub fn memory_usage(&self) -> usize {
        self.tries.iter().map(BandTrie::memory_usage).sum()
    }

    /// Check arity and every band's length without touching any trie.
    pub fn validate(&self, bitstrings: &[BitString]) -> Result<(), ValidationError> {
        if bitstrings.len() != self.tries.len() {
            return Err(ValidationError::BandCount {
                expected: self.tries.len(),
                got: bitstrings.len(),
            });
        }
        let expected = usize::from(self.height);
        for (band, bits) in bitstrings.iter().enumerate() {
            if bits.len() != expected {
                return Err(ValidationError::BitLength {
                    band,
                    expected,
                    got: bits.len(),
                });
            }
        }
        Ok(())
    }

    /// Insert `id` into band `i` under `bitstrings[i]` for every band.
    ///
    /// All bands are validated first, so an error leaves the index unchanged.
    pub fn insert(&mut self, id: I, bitstrings: &[BitString]) -> Result<(), ValidationError> {
        self.validate(bitstrings)?;
        trace!(?id, bands = self.tries.len(), "insert");
        for (trie, bits) in self.tries.iter_mut().zip(bitstrings) {
            trie.insert_unchecked(bits, id.clone());
        }
        Ok(())
    }

    /// [`insert`](Self::insert) with textual `"0"/"1"` fingerprints.
    pub fn insert_str<S: AsRef<str>>(&mut self, id: I, bitstrings: &[S]) -> Result<(), ValidationError> {
        let parsed = self.parse_all(bitstrings)?;
        self.insert(id, &parsed)
    }

    /// Per-band candidate lists for `bitstrings`, one list per band in band
    /// order. Every band is queried even when earlier ones come back empty.
    pub fn search(&self, bitstrings: &[BitString]) -> Result<Vec<&[I]>, ValidationError> {
        self.validate(bitstrings)?;
        let candidates: Vec<&[I]> = self
            .tries
            .iter()
            .zip(bitstrings)
            .map(|(trie, bits)| trie.traverse_unchecked(bits))
            .collect();
        trace!(
            hits = candidates.iter().map(|c| c.len()).sum::<usize>(),
            "search"
        );
        Ok(candidates)
    }

    /// [`search`](Self::search) with textual `"0"/"1"` fingerprints.
    pub fn search_str<S: AsRef<str>>(&self, bitstrings: &[S]) -> Result<Vec<&[I]>, ValidationError> {
        let parsed = self.parse_all(bitstrings)?;
        self.search(&parsed)
    }

    fn parse_all<S: AsRef<str>>(&self, bitstrings: &[S]) -> Result<Vec<BitString>, ValidationError> {
        if bitstrings.len() != self.tries.len() {
            return Err(ValidationError::BandCount {
                expected: self.tries.len(),
                got: bitstrings.len(),
            });
        }
        let expected = usize::from(self.height);
        bitstrings
            .iter()
            .enumerate()
            .map(|(band, s)| {
                let s = s.as_ref();
                // Report overlong strings as a length error rather than a width error.
                let got = s.chars().count();
                if got != expected {
                    return Err(ValidationError::BitLength { band, expected, got });
                }
                BitString::parse(s)
            })
            .collect()
    }
}

impl<I: ItemId> PartialEq for BandedIndex<I> {
    fn eq(&self, other: &Self) -> bool {
        self.height == other.height && self.tries == other.tries
    }
}

impl<I: ItemId> Eq for BandedIndex<I> {}

impl<I: ItemId> Default for BandedIndex<I> {
    fn default() -> Self {
        Self {
            tries: (0..8).map(|_| BandTrie::empty(16)).collect(),
            height: 16,
        }
    }
}
