//! # sortedkv - An Ordered Key-Value Storage Engine
//!
//! sortedkv pairs interchangeable in-memory stores with an immutable on-disk
//! table format. Any store can be flushed into a table, and a table can be
//! opened over any random-access byte source to serve point lookups and range
//! scans through a sparse index.
//!
//! ## Architecture
//!
//! The engine consists of a few small components:
//!
//! - **Store**: the common put/get/delete/range-scan protocol
//! - **MemTable**: skip list, hash map and linked list backends
//! - **Iterator**: forward cursors shared by stores and tables
//! - **SSTable**: the table writer (flush) and reader
//!
//! ## Example Usage
//!
//! ```rust
//! use sortedkv::sstable::{flush_store, Table};
//! use sortedkv::{KvIterator, Options, SkipListStore, Store};
//!
//! # fn main() -> Result<(), sortedkv::Error> {
//! let mut store = SkipListStore::new();
//! store.put(b"apple", b"red");
//! store.put(b"banana", b"yellow");
//! store.put(b"cherry", b"dark red");
//! store.delete(b"banana")?;
//!
//! // Export to the table format, here an in-memory buffer
//! let mut buffer = Vec::new();
//! flush_store(&store, &mut buffer, &Options::default())?;
//!
//! let table = Table::open(buffer)?;
//! assert_eq!(table.get(b"cherry")?, b"dark red");
//! assert!(table.get(b"banana").unwrap_err().is_not_found());
//!
//! let mut iter = table.range_scan(b"a", b"c")?;
//! while iter.advance() {
//!     println!("{:?} => {:?}", iter.key(), iter.value());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Stores assume exclusive access. Wrap one in a [`SharedStore`] to share it
//! between threads.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod config;
pub mod error;
pub mod iterator;
pub mod memtable;
pub mod sstable;
pub mod store;

// Re-exports
pub use config::Options;
pub use error::{Error, Result};
pub use iterator::{Entry, KvIterator, MaterializedIterator};
pub use memtable::{HashStore, LinkedListStore, SkipListStore};
pub use sstable::Table;
pub use store::{open_store, SharedStore, Store, StoreKind};

/// Crate version, as recorded in Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
