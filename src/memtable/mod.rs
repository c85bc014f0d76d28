//! # MemTable - In-Memory Stores
//!
//! Interchangeable in-memory backends behind the [`Store`](crate::Store)
//! contract. Any of them can be flushed to a sorted table through its full
//! range scan.
//!
//! ## Backends
//!
//! - [`SkipListStore`]: leveled linked structure with expected O(log n)
//!   search, the default memtable
//! - [`HashStore`]: unordered map, sorts keys on every scan; useful as a
//!   correctness oracle
//! - [`LinkedListStore`]: single sorted list, O(n) per operation; the simple
//!   ordered baseline
//!
//! ## Thread Safety
//!
//! None of the stores lock internally. Wrap one in
//! [`SharedStore`](crate::SharedStore) to share it between threads.

mod hash;
mod linked_list;
mod skiplist;

pub use hash::HashStore;
pub use linked_list::{LinkedListIterator, LinkedListStore};
pub use skiplist::{SkipListIterator, SkipListStore};

/// Height ceiling for skip list nodes.
///
/// With fair coin flips this keeps searches logarithmic for up to roughly
/// 2^12 entries, and degrades gracefully past that.
pub const MAX_LEVEL: usize = 12;
