//! Index configuration.

use serde::{Deserialize, Serialize};

use crate::bits::MAX_WIDTH;
use crate::error::ConfigError;

/// Shape of a banded index and the vote needed for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of bands (R), one trie each.
    pub bands: usize,
    /// Bits per band fingerprint (H).
    pub height: u8,
    /// Minimum number of band hits for an id to match (T).
    pub threshold: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            bands: 8,
            height: 16,
            threshold: 2,
        }
    }
}

impl IndexConfig {
    pub fn new(bands: usize, height: u8, threshold: usize) -> Self {
        Self {
            bands,
            height,
            threshold,
        }
    }

    pub fn with_bands(mut self, bands: usize) -> Self {
        self.bands = bands;
        self
    }

    pub fn with_height(mut self, height: u8) -> Self {
        self.height = height;
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bands == 0 {
            return Err(ConfigError::NoBands);
        }
        if self.height == 0 || usize::from(self.height) > MAX_WIDTH {
            return Err(ConfigError::Height(self.height));
        }
        if self.threshold == 0 || self.threshold > self.bands {
            return Err(ConfigError::Threshold {
                threshold: self.threshold,
                bands: self.bands,
            });
        }
        Ok(())
    }
}
