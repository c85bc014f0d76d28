//! The store contract every in-memory backend implements.
//!
//! ## Range convention
//!
//! `range_scan(start, limit)` covers the half-open interval `[start, limit)`.
//! An empty `limit` means "no upper bound" and an empty `start` already sorts
//! before every key, so `range_scan(b"", b"")` visits the whole store. A
//! non-empty `limit` that sorts before `start` is rejected with
//! [`Error::InvalidRange`].

use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;

use crate::config::Options;
use crate::error::{Error, Result};
use crate::iterator::{KvIterator, MaterializedIterator};
use crate::memtable::{HashStore, LinkedListStore, SkipListStore};

/// An in-memory key-value store.
///
/// A store never holds two entries with the same key; `put` on an existing
/// key replaces its value.
pub trait Store {
    /// Returns the value stored under `key`, or [`Error::KeyNotFound`].
    fn get(&self, key: &[u8]) -> Result<&[u8]>;

    /// Returns true if `key` is present.
    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_ok()
    }

    /// Inserts `key` or overwrites its value.
    fn put(&mut self, key: &[u8], value: &[u8]);

    /// Removes `key`, or fails with [`Error::KeyNotFound`] if it is absent.
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Returns a cursor over the entries with keys in `[start, limit)`,
    /// ascending.
    fn range_scan<'a>(&'a self, start: &[u8], limit: &[u8])
        -> Result<Box<dyn KvIterator + 'a>>;

    /// Number of live keys.
    fn len(&self) -> usize;

    /// Returns true if the store holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cursor over every entry, the input the table writer expects.
    fn scan_all(&self) -> Result<Box<dyn KvIterator + '_>> {
        self.range_scan(b"", b"")
    }
}

/// Rejects a scan whose bounded `limit` sorts before `start`.
pub(crate) fn check_range(start: &[u8], limit: &[u8]) -> Result<()> {
    if !limit.is_empty() && start > limit {
        return Err(Error::invalid_range(start, limit));
    }
    Ok(())
}

/// Returns true if `key` is below `limit`, treating an empty limit as open.
pub(crate) fn below_limit(key: &[u8], limit: &[u8]) -> bool {
    limit.is_empty() || key < limit
}

/// The available in-memory backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// Probabilistically balanced skip list, O(log n) expected
    SkipList,
    /// Unordered hash map; scans sort on demand
    Hash,
    /// Sorted doubly-linked list, O(n) per operation
    LinkedList,
}

impl StoreKind {
    /// All backends, in reporting order.
    pub const ALL: [StoreKind; 3] = [StoreKind::Hash, StoreKind::LinkedList, StoreKind::SkipList];

    /// Short lowercase name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            StoreKind::SkipList => "skiplist",
            StoreKind::Hash => "hash",
            StoreKind::LinkedList => "linkedlist",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "skiplist" | "skip" => Ok(StoreKind::SkipList),
            "hash" | "simple" => Ok(StoreKind::Hash),
            "linkedlist" | "linked" | "list" => Ok(StoreKind::LinkedList),
            other => Err(Error::invalid_argument(format!("unknown store kind: {}", other))),
        }
    }
}

/// Creates an empty store of the given kind.
pub fn open_store(kind: StoreKind, options: &Options) -> Result<Box<dyn Store + Send + Sync>> {
    options.validate()?;

    let store: Box<dyn Store + Send + Sync> = match kind {
        StoreKind::SkipList => Box::new(SkipListStore::with_options(options)?),
        StoreKind::Hash => Box::new(HashStore::new()),
        StoreKind::LinkedList => Box::new(LinkedListStore::new()),
    };
    Ok(store)
}

/// A store shared between threads.
///
/// Splicing a node touches several forward links, so every mutation takes
/// the single writer lock. Readers share the read lock, and scans copy the
/// qualifying window out before the lock is released.
///
/// # Example
///
/// ```rust
/// use sortedkv::{SharedStore, SkipListStore};
/// use std::sync::Arc;
///
/// let store = Arc::new(SharedStore::new(SkipListStore::new()));
/// store.put(b"key", b"value");
/// assert_eq!(store.get(b"key").unwrap(), b"value".to_vec());
/// ```
pub struct SharedStore<S> {
    inner: RwLock<S>,
}

impl<S: Store> SharedStore<S> {
    /// Wraps `store` for shared access.
    pub fn new(store: S) -> Self {
        Self { inner: RwLock::new(store) }
    }

    /// Returns a copy of the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.inner.read().get(key).map(|v| v.to_vec())
    }

    /// Returns true if `key` is present.
    pub fn has(&self, key: &[u8]) -> bool {
        self.inner.read().has(key)
    }

    /// Inserts or overwrites `key` under the writer lock.
    pub fn put(&self, key: &[u8], value: &[u8]) {
        self.inner.write().put(key, value);
    }

    /// Removes `key` under the writer lock.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.inner.write().delete(key)
    }

    /// Copies the entries in `[start, limit)` into a detached iterator.
    pub fn range_scan(&self, start: &[u8], limit: &[u8]) -> Result<MaterializedIterator> {
        let guard = self.inner.read();
        let mut iter = guard.range_scan(start, limit)?;
        let entries = iter.collect_entries()?;
        Ok(MaterializedIterator::new(entries))
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Runs `f` with shared access to the underlying store, e.g. to flush it.
    pub fn with_read<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        let guard = self.inner.read();
        f(&*guard)
    }

    /// Unwraps the underlying store.
    pub fn into_inner(self) -> S {
        self.inner.into_inner()
    }
}
