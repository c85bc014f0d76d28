//! Hash map store.
//!
//! Carries no ordering of its own; every range scan collects the qualifying
//! keys and sorts them. Handy as a reference when checking the ordered
//! stores.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::iterator::{Entry, KvIterator, MaterializedIterator};
use crate::store::{below_limit, check_range, Store};

/// Unordered in-memory store.
#[derive(Debug, Default, Clone)]
pub struct HashStore {
    map: HashMap<Vec<u8>, Vec<u8>>,
}

impl HashStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for HashStore {
    fn get(&self, key: &[u8]) -> Result<&[u8]> {
        self.map.get(key).map(Vec::as_slice).ok_or(Error::KeyNotFound)
    }

    fn has(&self, key: &[u8]) -> bool {
        self.map.contains_key(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.map.insert(key.to_vec(), value.to_vec());
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.map.remove(key).map(|_| ()).ok_or(Error::KeyNotFound)
    }

    fn range_scan<'a>(
        &'a self,
        start: &[u8],
        limit: &[u8],
    ) -> Result<Box<dyn KvIterator + 'a>> {
        check_range(start, limit)?;

        let mut entries: Vec<Entry> = self
            .map
            .iter()
            .filter(|(key, _)| key.as_slice() >= start && below_limit(key, limit))
            .map(|(key, value)| Entry::new(key, value))
            .collect();
        entries.sort_unstable_by(|a, b| a.key.cmp(&b.key));

        Ok(Box::new(MaterializedIterator::new(entries)))
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}
