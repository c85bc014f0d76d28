//! Cursor protocol shared by every store and by tables.
//!
//! A [`KvIterator`] is a single-pass, forward-only cursor. It starts
//! positioned *before* the first entry; each call to
//! [`advance`](KvIterator::advance) moves to the next entry and reports
//! whether one exists:
//!
//! ```rust
//! use sortedkv::{KvIterator, SkipListStore, Store};
//!
//! let mut store = SkipListStore::new();
//! store.put(b"a", b"alpha");
//! store.put(b"b", b"bravo");
//!
//! let mut iter = store.range_scan(b"", b"").unwrap();
//! while iter.advance() {
//!     println!("{:?} => {:?}", iter.key(), iter.value());
//! }
//! assert!(iter.error().is_none());
//! ```

use crate::error::{Error, Result};

/// A key-value pair. Keys order by unsigned lexicographic byte comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entry {
    /// Sort and lookup key
    pub key: Vec<u8>,
    /// Opaque payload
    pub value: Vec<u8>,
}

impl Entry {
    /// Create a new Entry by copying key and value.
    pub fn new(key: &[u8], value: &[u8]) -> Self {
        Self { key: key.to_vec(), value: value.to_vec() }
    }
}

/// Forward cursor over entries in ascending key order.
///
/// Iterators borrow their store, so the store cannot be mutated while one is
/// alive.
pub trait KvIterator {
    /// Moves to the next entry. Returns `true` if the cursor now points at an
    /// entry, `false` once the sequence is exhausted.
    fn advance(&mut self) -> bool;

    /// Returns true if the iterator is positioned at an entry.
    fn valid(&self) -> bool;

    /// Key of the current entry. Empty before the first `advance` and after
    /// exhaustion.
    fn key(&self) -> &[u8];

    /// Value of the current entry. Empty before the first `advance` and after
    /// exhaustion.
    fn value(&self) -> &[u8];

    /// A deferred decode or I/O error found during iteration, if any.
    /// Exhaustion alone is not an error.
    fn error(&self) -> Option<&Error>;

    /// Removes and returns the deferred error.
    fn take_error(&mut self) -> Option<Error>;

    /// Drains the remaining entries into a vector, then surfaces the deferred
    /// error if one was recorded.
    fn collect_entries(&mut self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        while self.advance() {
            entries.push(Entry::new(self.key(), self.value()));
        }
        match self.take_error() {
            Some(err) => Err(err),
            None => Ok(entries),
        }
    }
}

impl<I: KvIterator + ?Sized> KvIterator for Box<I> {
    fn advance(&mut self) -> bool {
        (**self).advance()
    }

    fn valid(&self) -> bool {
        (**self).valid()
    }

    fn key(&self) -> &[u8] {
        (**self).key()
    }

    fn value(&self) -> &[u8] {
        (**self).value()
    }

    fn error(&self) -> Option<&Error> {
        (**self).error()
    }

    fn take_error(&mut self) -> Option<Error> {
        (**self).take_error()
    }
}

/// Iterator over an already decoded sequence of entries.
///
/// Used where the qualifying window is bounded and cheap to build up front:
/// table range scans, the hash store, and shared-store snapshots.
#[derive(Debug, Default)]
pub struct MaterializedIterator {
    entries: Vec<Entry>,
    /// Index of the current entry, `None` before the first advance
    current: Option<usize>,
    error: Option<Error>,
}

impl MaterializedIterator {
    /// Creates an iterator over `entries`, which must already be sorted.
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries, current: None, error: None }
    }

    /// Creates an iterator that yields `entries` and then reports `error`.
    pub fn with_error(entries: Vec<Entry>, error: Error) -> Self {
        Self { entries, current: None, error: Some(error) }
    }

    /// Creates an iterator with nothing to yield.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Total number of entries held, including ones already visited.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the iterator holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn current_entry(&self) -> Option<&Entry> {
        self.current.and_then(|i| self.entries.get(i))
    }
}

impl KvIterator for MaterializedIterator {
    fn advance(&mut self) -> bool {
        let next = match self.current {
            None => 0,
            Some(i) if i < self.entries.len() => i + 1,
            Some(i) => i,
        };
        self.current = Some(next);
        next < self.entries.len()
    }

    fn valid(&self) -> bool {
        self.current_entry().is_some()
    }

    fn key(&self) -> &[u8] {
        self.current_entry().map(|e| e.key.as_slice()).unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.current_entry().map(|e| e.value.as_slice()).unwrap_or_default()
    }

    fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }
}
