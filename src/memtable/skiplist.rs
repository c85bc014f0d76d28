//! Skip list store.
//!
//! Nodes live in an arena and refer to each other by slot index. Slot 0 is
//! the head sentinel, which always has `MAX_LEVEL` forward links. A node of
//! level `L` is linked into the lists at heights `0..L`; height 0 links every
//! node in ascending key order.
//!
//! ```text
//! height 2: head ---------------------> [m] -----------------> nil
//! height 1: head ------> [d] ---------> [m] ------> [t] -----> nil
//! height 0: head -> [a] -> [d] -> [g] -> [m] -> [p] -> [t] --> nil
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::MAX_LEVEL;
use crate::config::Options;
use crate::error::{Error, Result};
use crate::iterator::{Entry, KvIterator};
use crate::store::{below_limit, check_range, Store};

/// Arena slot index.
type NodeId = usize;

/// Slot of the head sentinel.
const HEAD: NodeId = 0;

#[derive(Debug)]
struct Node {
    entry: Entry,
    /// Forward links; only the first `level` are meaningful
    next: [Option<NodeId>; MAX_LEVEL],
    level: usize,
}

impl Node {
    fn new(entry: Entry, level: usize) -> Self {
        Self { entry, next: [None; MAX_LEVEL], level }
    }

    fn key(&self) -> &[u8] {
        &self.entry.key
    }
}

/// Ordered in-memory store backed by a skip list.
///
/// # Example
///
/// ```rust
/// use sortedkv::{SkipListStore, Store};
///
/// let mut store = SkipListStore::new();
/// store.put(b"key1", b"value1");
/// assert_eq!(store.get(b"key1").unwrap(), b"value1");
/// store.delete(b"key1").unwrap();
/// assert!(!store.has(b"key1"));
/// ```
#[derive(Debug)]
pub struct SkipListStore {
    nodes: Vec<Node>,
    /// Slots released by `delete`, reused by `put`
    free: Vec<NodeId>,
    /// Active level count: highest level any node has used
    height: usize,
    max_level: usize,
    len: usize,
    rng: StdRng,
}

impl SkipListStore {
    /// Creates an empty store with an OS-seeded level generator.
    pub fn new() -> Self {
        Self::build(MAX_LEVEL, StdRng::from_os_rng())
    }

    /// Creates an empty store whose level draws are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::build(MAX_LEVEL, StdRng::seed_from_u64(seed))
    }

    /// Creates an empty store from `options.max_level` and `options.seed`.
    pub fn with_options(options: &Options) -> Result<Self> {
        options.validate()?;
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self::build(options.max_level, rng))
    }

    fn build(max_level: usize, rng: StdRng) -> Self {
        let head = Node::new(Entry::default(), MAX_LEVEL);
        Self { nodes: vec![head], free: Vec::new(), height: 1, max_level, len: 0, rng }
    }

    /// Active level count. Grows with taller nodes and never shrinks.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns an iterator over all entries.
    pub fn iter(&self) -> SkipListIterator<'_> {
        SkipListIterator::new(self, self.nodes[HEAD].next[0], Vec::new())
    }

    /// Walks down from the top active level and records, per height, the
    /// last node whose key is below `key`.
    ///
    /// Heights at or above the active level count keep the head sentinel,
    /// which is the right predecessor for a node that raises the height.
    fn find_predecessors(&self, key: &[u8]) -> [NodeId; MAX_LEVEL] {
        let mut preds = [HEAD; MAX_LEVEL];
        let mut node = HEAD;

        for h in (0..self.height).rev() {
            while let Some(next) = self.nodes[node].next[h] {
                if self.nodes[next].key() < key {
                    node = next;
                } else {
                    break;
                }
            }
            preds[h] = node;
        }

        preds
    }

    /// The node holding `key`, given the predecessors computed for it.
    fn matching_node(&self, preds: &[NodeId; MAX_LEVEL], key: &[u8]) -> Option<NodeId> {
        self.nodes[preds[0]].next[0].filter(|&id| self.nodes[id].key() == key)
    }

    /// Fair coin flips, truncated at the ceiling:
    /// P(level >= k) = 2^-(k-1).
    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < self.max_level && self.rng.random_bool(0.5) {
            level += 1;
        }
        level
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        let node = &mut self.nodes[id];
        node.entry = Entry::default();
        node.next = [None; MAX_LEVEL];
        node.level = 0;
        self.free.push(id);
    }

    /// Verifies ordering and level membership on every active height.
    #[cfg(test)]
    fn check_invariants(&self) {
        let mut level_zero = Vec::new();
        let mut node = self.nodes[HEAD].next[0];
        while let Some(id) = node {
            level_zero.push(id);
            node = self.nodes[id].next[0];
        }
        assert_eq!(level_zero.len(), self.len);

        for h in 0..self.height {
            let mut prev: Option<&[u8]> = None;
            let mut node = self.nodes[HEAD].next[h];
            let mut expected = level_zero.iter().filter(|&&id| self.nodes[id].level > h);

            while let Some(id) = node {
                let key = self.nodes[id].key();
                if let Some(prev) = prev {
                    assert!(prev < key, "height {} out of order", h);
                }
                assert_eq!(Some(&id), expected.next(), "height {} skips a member", h);
                prev = Some(key);
                node = self.nodes[id].next[h];
            }
            assert_eq!(expected.next(), None, "height {} is missing members", h);
        }

        for h in self.height..MAX_LEVEL {
            assert_eq!(self.nodes[HEAD].next[h], None);
        }
    }
}

impl Default for SkipListStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for SkipListStore {
    fn get(&self, key: &[u8]) -> Result<&[u8]> {
        let preds = self.find_predecessors(key);
        match self.matching_node(&preds, key) {
            Some(id) => Ok(&self.nodes[id].entry.value),
            None => Err(Error::KeyNotFound),
        }
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        let preds = self.find_predecessors(key);

        if let Some(id) = self.matching_node(&preds, key) {
            let entry = &mut self.nodes[id].entry;
            entry.value.clear();
            entry.value.extend_from_slice(value);
            return;
        }

        let level = self.random_level();
        let id = self.allocate(Node::new(Entry::new(key, value), level));

        // The predecessors were computed against the pre-insert structure and
        // splicing at one height never moves a predecessor at another.
        for (h, &pred) in preds.iter().enumerate().take(level) {
            self.nodes[id].next[h] = self.nodes[pred].next[h];
            self.nodes[pred].next[h] = Some(id);
        }

        if level > self.height {
            self.height = level;
        }
        self.len += 1;
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        let preds = self.find_predecessors(key);
        let id = self.matching_node(&preds, key).ok_or(Error::KeyNotFound)?;

        for h in (0..self.nodes[id].level).rev() {
            self.nodes[preds[h]].next[h] = self.nodes[id].next[h];
        }

        // The active level count is left as is even if this was the only
        // node at the top height.
        self.release(id);
        self.len -= 1;
        Ok(())
    }

    fn range_scan<'a>(
        &'a self,
        start: &[u8],
        limit: &[u8],
    ) -> Result<Box<dyn KvIterator + 'a>> {
        check_range(start, limit)?;

        let preds = self.find_predecessors(start);
        let first = self.nodes[preds[0]].next[0];
        Ok(Box::new(SkipListIterator::new(self, first, limit.to_vec())))
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Cursor walking the height-0 links of a [`SkipListStore`].
pub struct SkipListIterator<'a> {
    list: &'a SkipListStore,
    /// Node the next `advance` will move to
    pending: Option<NodeId>,
    current: Option<NodeId>,
    /// Exclusive upper bound; empty means unbounded
    limit: Vec<u8>,
}

impl<'a> SkipListIterator<'a> {
    fn new(list: &'a SkipListStore, first: Option<NodeId>, limit: Vec<u8>) -> Self {
        Self { list, pending: first, current: None, limit }
    }

    fn current_entry(&self) -> Option<&'a Entry> {
        let list = self.list;
        self.current.map(|id| &list.nodes[id].entry)
    }
}

impl<'a> KvIterator for SkipListIterator<'a> {
    fn advance(&mut self) -> bool {
        match self.pending {
            Some(id) if below_limit(self.list.nodes[id].key(), &self.limit) => {
                self.current = Some(id);
                self.pending = self.list.nodes[id].next[0];
                true
            }
            _ => {
                self.current = None;
                self.pending = None;
                false
            }
        }
    }

    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn key(&self) -> &[u8] {
        self.current_entry().map(|e| e.key.as_slice()).unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.current_entry().map(|e| e.value.as_slice()).unwrap_or_default()
    }

    fn error(&self) -> Option<&Error> {
        None
    }

    fn take_error(&mut self) -> Option<Error> {
        None
    }
}
