//! SSTable (Sorted String Table) implementation.
//!
//! An SSTable is an immutable, sorted file written in one streaming pass and
//! read back through a sparse in-memory index.
//!
//! ## File Format
//!
//! ```text
//! [Data Section]    // records in ascending key order, no padding
//! [Index Section]   // sparse index records
//! [Trailer: 4B]     // u32 offset where the index section starts
//! ```
//!
//! All integers are little-endian `u32`.
//!
//! ## Record Format
//!
//! ```text
//! data:  [key_len: u32][key][value_len: u32][value]
//! index: [key_len: u32][key][block_offset: u32]
//! ```
//!
//! ## Sparse Index
//!
//! The writer records the first record of the table and then the first
//! record starting at or after every `block_size` byte checkpoint, plus the
//! final record. A block is the byte span between two consecutive index
//! offsets; the last block ends where the index section begins. The block
//! size is not stored in the file, so readers never need to know it.

pub mod block;
pub mod builder;
pub mod footer;
pub mod index;
pub mod reader;
pub mod source;

pub use block::{Block, BlockIterator};
pub use builder::{flush, flush_store, TableBuilder, TableSummary};
pub use footer::Footer;
pub use index::{BlockHandle, IndexBuilder, IndexEntry, SparseIndex};
pub use reader::Table;
pub use source::{ByteSource, SeekSource};

/// Default sparse index checkpoint granularity (4KB)
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Trailer size in bytes (fixed)
pub const FOOTER_SIZE: usize = 4;

/// Size of every length prefix and offset field
pub(crate) const LEN_SIZE: usize = 4;
