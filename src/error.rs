//! Error types for the sortedkv engine.

use std::io;
use thiserror::Error;

/// The result type used throughout sortedkv.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for store and table operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested key is not present.
    ///
    /// This is an expected outcome of a lookup or delete miss, not a failure of
    /// the engine itself.
    #[error("Key not found")]
    KeyNotFound,

    /// A range scan was requested with `start` sorting after `limit`.
    #[error("Invalid range: start {start:?} is after limit {limit:?}")]
    InvalidRange {
        /// Lower bound given by the caller.
        start: Vec<u8>,
        /// Upper bound given by the caller.
        limit: Vec<u8>,
    },

    /// The table bytes violate the on-disk format.
    #[error("Corrupt table: {0}")]
    CorruptTable(String),

    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An I/O error from the underlying byte source or sink.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Creates a new corrupt table error.
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::CorruptTable(msg.into())
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Creates a new invalid range error from the offending bounds.
    pub fn invalid_range(start: &[u8], limit: &[u8]) -> Self {
        Error::InvalidRange { start: start.to_vec(), limit: limit.to_vec() }
    }

    /// Returns `true` for a lookup or delete miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound)
    }

    /// Returns `true` if the error reports a format violation.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::CorruptTable(_))
    }
}
