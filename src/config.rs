//! Configuration options for sortedkv stores and tables.

use crate::memtable::MAX_LEVEL;
use crate::sstable::DEFAULT_BLOCK_SIZE;

/// Configuration shared by the in-memory stores and the table writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Sparse index checkpoint granularity (in bytes).
    ///
    /// The writer records one index entry roughly every `block_size` bytes of
    /// data. The value is not stored in the table, so readers never need it.
    /// Default: 4KB
    pub block_size: usize,

    /// Height ceiling for skip list nodes.
    /// Default: 12
    pub max_level: usize,

    /// Seed for skip list level generation.
    /// `None` seeds from the operating system.
    /// Default: None
    pub seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self { block_size: DEFAULT_BLOCK_SIZE, max_level: MAX_LEVEL, seed: None }
    }
}

impl Options {
    /// Creates a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sparse index checkpoint granularity.
    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    /// Sets the skip list height ceiling.
    pub fn max_level(mut self, level: usize) -> Self {
        self.max_level = level;
        self
    }

    /// Makes skip list level generation deterministic.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.block_size == 0 {
            return Err(crate::Error::invalid_argument("block_size must be > 0"));
        }
        if u32::try_from(self.block_size).is_err() {
            return Err(crate::Error::invalid_argument("block_size must fit in 32 bits"));
        }
        if self.max_level == 0 || self.max_level > MAX_LEVEL {
            return Err(crate::Error::invalid_argument(format!(
                "max_level must be between 1 and {}",
                MAX_LEVEL
            )));
        }
        Ok(())
    }
}
