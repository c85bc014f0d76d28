//! Sorted doubly-linked list store.
//!
//! Slots 0 and 1 of the arena are the head and tail sentinels; real nodes
//! sit between them in ascending key order. Every operation walks from the
//! head, so lookups and updates are O(n).

use crate::error::{Error, Result};
use crate::iterator::{Entry, KvIterator};
use crate::store::{below_limit, check_range, Store};

type NodeId = usize;

const HEAD: NodeId = 0;
const TAIL: NodeId = 1;

#[derive(Debug)]
struct Node {
    entry: Entry,
    prev: NodeId,
    next: NodeId,
}

/// Ordered in-memory store backed by a doubly-linked list.
#[derive(Debug)]
pub struct LinkedListStore {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    len: usize,
}

impl LinkedListStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let head = Node { entry: Entry::default(), prev: HEAD, next: TAIL };
        let tail = Node { entry: Entry::default(), prev: HEAD, next: TAIL };
        Self { nodes: vec![head, tail], free: Vec::new(), len: 0 }
    }

    /// First node whose key is not below `key`, or the tail sentinel.
    fn first_at_or_after(&self, key: &[u8]) -> NodeId {
        let mut node = self.nodes[HEAD].next;
        while node != TAIL && self.nodes[node].entry.key.as_slice() < key {
            node = self.nodes[node].next;
        }
        node
    }

    fn find(&self, key: &[u8]) -> Option<NodeId> {
        let node = self.first_at_or_after(key);
        (node != TAIL && self.nodes[node].entry.key == key).then_some(node)
    }
}

impl Default for LinkedListStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for LinkedListStore {
    fn get(&self, key: &[u8]) -> Result<&[u8]> {
        self.find(key).map(|id| self.nodes[id].entry.value.as_slice()).ok_or(Error::KeyNotFound)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        let at = self.first_at_or_after(key);
        if at != TAIL && self.nodes[at].entry.key == key {
            let entry = &mut self.nodes[at].entry;
            entry.value.clear();
            entry.value.extend_from_slice(value);
            return;
        }

        // Insert before `at`
        let prev = self.nodes[at].prev;
        let node = Node { entry: Entry::new(key, value), prev, next: at };
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.nodes[prev].next = id;
        self.nodes[at].prev = id;
        self.len += 1;
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        let id = self.find(key).ok_or(Error::KeyNotFound)?;

        let (prev, next) = (self.nodes[id].prev, self.nodes[id].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;

        self.nodes[id].entry = Entry::default();
        self.free.push(id);
        self.len -= 1;
        Ok(())
    }

    fn range_scan<'a>(
        &'a self,
        start: &[u8],
        limit: &[u8],
    ) -> Result<Box<dyn KvIterator + 'a>> {
        check_range(start, limit)?;

        let first = self.first_at_or_after(start);
        Ok(Box::new(LinkedListIterator {
            list: self,
            pending: first,
            current: None,
            limit: limit.to_vec(),
        }))
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Cursor over a [`LinkedListStore`].
pub struct LinkedListIterator<'a> {
    list: &'a LinkedListStore,
    pending: NodeId,
    current: Option<NodeId>,
    limit: Vec<u8>,
}

impl<'a> LinkedListIterator<'a> {
    fn current_entry(&self) -> Option<&'a Entry> {
        let list = self.list;
        self.current.map(|id| &list.nodes[id].entry)
    }
}

impl<'a> KvIterator for LinkedListIterator<'a> {
    fn advance(&mut self) -> bool {
        let node = self.pending;
        if node != TAIL && below_limit(&self.list.nodes[node].entry.key, &self.limit) {
            self.current = Some(node);
            self.pending = self.list.nodes[node].next;
            true
        } else {
            self.current = None;
            self.pending = TAIL;
            false
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
