//! SSTable reader implementation.
//!
//! Opening a table reads only the trailer and the index section. Lookups and
//! scans then read just the byte window of the data section the sparse index
//! resolves them to.

use crate::error::{Error, Result};
use crate::iterator::{Entry, KvIterator, MaterializedIterator};
use crate::sstable::block::Block;
use crate::sstable::footer::Footer;
use crate::sstable::index::{BlockHandle, SparseIndex};
use crate::sstable::source::ByteSource;
use crate::sstable::FOOTER_SIZE;
use crate::store::check_range;
use std::fs::File;
use std::path::Path;

/// Table provides read access to an immutable table over a byte source.
///
/// Usage:
/// ```no_run
/// use sortedkv::sstable::Table;
///
/// let table = Table::open_path("table.sst").unwrap();
/// let value = table.get(b"key1").unwrap();
/// println!("Found: {:?}", value);
/// ```
#[derive(Debug)]
pub struct Table<S> {
    source: S,
    index: SparseIndex,
    /// Length of the data section
    data_len: u32,
    /// Length of the whole source
    size: u64,
}

impl Table<File> {
    /// Open a table file for reading
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(File::open(path)?)
    }
}

impl<S: ByteSource> Table<S> {
    /// Parses the trailer and sparse index of `source`.
    ///
    /// Fails with a corrupt table error when the trailer points past itself or
    /// the index section is malformed; no partial table is returned.
    pub fn open(source: S) -> Result<Self> {
        let size = source.size()?;
        if size < FOOTER_SIZE as u64 {
            log::warn!("Rejecting table: {} bytes is too small to hold a trailer", size);
            return Err(Error::corruption(format!(
                "{} byte source is too small to hold a trailer",
                size
            )));
        }

        let trailer_pos = size - FOOTER_SIZE as u64;
        let footer = Footer::read_from(&source, size)?;
        let index_start = footer.index_offset as u64;
        if index_start > trailer_pos {
            log::warn!(
                "Rejecting table: index offset {} is past the trailer at {}",
                index_start,
                trailer_pos
            );
            return Err(Error::corruption(format!(
                "index offset {} is past the trailer at {}",
                index_start, trailer_pos
            )));
        }

        if index_start == trailer_pos {
            log::debug!("Opened empty table of {} bytes", size);
            return Ok(Self { source, index: SparseIndex::default(), data_len: 0, size });
        }

        let index_len = usize::try_from(trailer_pos - index_start)
            .map_err(|_| Error::corruption("index section does not fit in memory"))?;
        let index_data = source.read_range(index_start, index_len)?;
        let index = SparseIndex::decode(index_data, footer.index_offset).inspect_err(|e| {
            log::warn!("Rejecting table: {}", e);
        })?;

        log::debug!(
            "Opened table: {} index entries, {} data bytes, {} bytes total",
            index.len(),
            footer.index_offset,
            size
        );

        Ok(Self { source, index, data_len: footer.index_offset, size })
    }

    /// Reads the data section window `[start, end)`.
    fn read_window(&self, start: u32, end: u32) -> Result<Block> {
        let data = self.source.read_range(start as u64, (end - start) as usize)?;
        Ok(Block::new(data, start))
    }

    fn read_block(&self, handle: BlockHandle) -> Result<Block> {
        self.read_window(handle.offset, handle.end_offset())
    }

    /// Get the value for a key.
    ///
    /// Returns `KeyNotFound` on a miss. The whole resolved block is decoded,
    /// so a truncated record anywhere in it is reported as corruption.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let handle = self.index.find_block(key, self.data_len).ok_or(Error::KeyNotFound)?;
        let block = self.read_block(handle)?;

        let mut iter = block.iter();
        let mut found = None;
        while iter.advance() {
            if found.is_none() && iter.key() == key {
                found = Some(iter.value().to_vec());
            }
        }
        if let Some(err) = iter.take_error() {
            return Err(err);
        }
        found.ok_or(Error::KeyNotFound)
    }

    /// Returns true if `key` is present.
    pub fn has(&self, key: &[u8]) -> Result<bool> {
        match self.get(key) {
            Ok(_) => Ok(true),
            Err(Error::KeyNotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Scans entries with keys in `[start, limit)`.
    ///
    /// An empty `limit` is unbounded. The qualifying window is decoded up
    /// front; a record that fails to decode ends the scan and is reported
    /// through the iterator's error accessor, keeping the entries before it.
    /// Reading the source itself fails the call.
    pub fn range_scan(&self, start: &[u8], limit: &[u8]) -> Result<MaterializedIterator> {
        check_range(start, limit)?;

        let (first, last) = match (self.index.first_key(), self.index.last_key()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(MaterializedIterator::empty()),
        };
        if start > last || (!limit.is_empty() && limit <= first) {
            return Ok(MaterializedIterator::empty());
        }

        let window_start = if start <= first {
            0
        } else {
            self.index.find_block(start, self.data_len).map_or(0, |h| h.offset)
        };
        let window_end = if limit.is_empty() {
            self.data_len
        } else {
            self.index.find_block(limit, self.data_len).map_or(self.data_len, |h| h.end_offset())
        };

        let block = self.read_window(window_start, window_end)?;
        let mut iter = block.iter();
        let mut entries = Vec::new();
        while iter.advance() {
            let key = iter.key();
            if !limit.is_empty() && key >= limit {
                break;
            }
            if key >= start {
                entries.push(Entry::new(key, iter.value()));
            }
        }

        Ok(match iter.take_error() {
            Some(err) => MaterializedIterator::with_error(entries, err),
            None => MaterializedIterator::new(entries),
        })
    }

    /// Scans the whole table.
    pub fn iter(&self) -> Result<MaterializedIterator> {
        self.range_scan(b"", b"")
    }

    /// Number of sparse index entries
    pub fn len_index(&self) -> usize {
        self.index.len()
    }

    /// The parsed sparse index
    pub fn index(&self) -> &SparseIndex {
        &self.index
    }

    /// Length of the data section
    pub fn data_len(&self) -> u32 {
        self.data_len
    }

    /// Length of the whole table
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Smallest key in the table
    pub fn first_key(&self) -> Option<&[u8]> {
        self.index.first_key()
    }

    /// Largest key in the table
    pub fn last_key(&self) -> Option<&[u8]> {
        self.index.last_key()
    }

    /// Returns true if the table holds no records
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The underlying byte source
    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::sstable::builder::TableBuilder;
    use bytes::Bytes;

    fn build(entries: &[(&[u8], &[u8])], block_size: usize) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();
        let mut builder =
            TableBuilder::new(&mut out, &Options::default().block_size(block_size)).unwrap();
        for (key, value) in entries {
            builder.add(key, value).unwrap();
        }
        builder.finish().unwrap();
        out
    }

    fn keys(iter: MaterializedIterator) -> Vec<Vec<u8>> {
        let mut iter = iter;
        iter.collect_entries().unwrap().into_iter().map(|e| e.key).collect()
    }

    #[test]
    fn test_open_and_get() {
        let data = build(&[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")], 4096);
        let table = Table::open(data).unwrap();

        assert_eq!(table.get(b"a").unwrap(), b"1");
        assert_eq!(table.get(b"b").unwrap(), b"2");
        assert_eq!(table.get(b"c").unwrap(), b"3");
        assert!(table.get(b"0").unwrap_err().is_not_found());
        assert!(table.get(b"bb").unwrap_err().is_not_found());
        assert!(table.get(b"d").unwrap_err().is_not_found());

        assert!(table.has(b"a").unwrap());
        assert!(!table.has(b"z").unwrap());
        assert_eq!(table.first_key(), Some(&b"a"[..]));
        assert_eq!(table.last_key(), Some(&b"c"[..]));
    }

    #[test]
    fn test_last_block_keys_are_found() {
        // 18 byte records against 40 byte blocks: a checkpoint every third record
        let entries: Vec<(Vec<u8>, Vec<u8>)> =
            (0..20u8).map(|i| (vec![b'k', b'a' + i], vec![i; 8])).collect();
        let refs: Vec<(&[u8], &[u8])> =
            entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice())).collect();
        let table = Table::open(build(&refs, 40)).unwrap();
        assert!(table.len_index() > 2);

        let last = table.index().entries().last().unwrap().offset;
        for (key, value) in &entries {
            assert_eq!(&table.get(key).unwrap(), value, "key {:?}", key);
        }
        // The final block starts at the last index offset and ends at the index section
        let handle = table.index().find_block(b"kt", table.data_len()).unwrap();
        assert_eq!(handle.offset, last);
        assert_eq!(handle.end_offset(), table.data_len());
    }

    #[test]
    fn test_empty_table() {
        let table = Table::open(vec![0u8, 0, 0, 0]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.data_len(), 0);
        assert!(table.get(b"a").unwrap_err().is_not_found());
        assert!(table.iter().unwrap().is_empty());
    }

    #[test]
    fn test_range_scan() {
        let data = build(&[(b"a", b"1"), (b"b", b"2"), (b"c", b"3"), (b"d", b"4")], 16);
        let table = Table::open(Bytes::from(data)).unwrap();

        assert_eq!(keys(table.range_scan(b"b", b"d").unwrap()), vec![b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(keys(table.range_scan(b"bb", b"").unwrap()), vec![b"c".to_vec(), b"d".to_vec()]);
        assert_eq!(keys(table.range_scan(b"", b"b").unwrap()), vec![b"a".to_vec()]);
        assert_eq!(keys(table.iter().unwrap()).len(), 4);

        assert!(table.range_scan(b"e", b"").unwrap().is_empty());
        assert!(table.range_scan(b"", b"a").unwrap().is_empty());
        assert!(table.range_scan(b"b", b"b").unwrap().is_empty());

        let err = table.range_scan(b"d", b"b").unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
    }

    #[test]
    fn test_trailer_at_itself_means_empty() {
        let err = Table::open(vec![9u8, 9, 4, 0, 0, 0]).unwrap_err();
        assert!(err.is_corruption());

        // Bytes before a trailer that points at itself are never read
        let table = Table::open(vec![9u8, 9, 2, 0, 0, 0]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.data_len(), 0);
    }

    #[test]
    fn test_open_rejects_short_source() {
        assert!(Table::open(vec![1u8, 2, 3]).unwrap_err().is_corruption());
    }

    #[test]
    fn test_open_rejects_trailer_past_itself() {
        let mut data = build(&[(b"a", b"1")], 4096);
        let len = data.len();
        data[len - 4..].copy_from_slice(&(len as u32).to_le_bytes());
        assert!(Table::open(data).unwrap_err().is_corruption());
    }

    #[test]
    fn test_open_rejects_truncated_index() {
        let mut data = build(&[(b"a", b"1"), (b"b", b"2")], 4096);
        // Drop the last index byte but keep a trailer pointing at the index start
        let trailer = data.split_off(data.len() - 4);
        data.pop();
        data.extend_from_slice(&trailer);
        assert!(Table::open(data).unwrap_err().is_corruption());
    }

    #[test]
    fn test_truncated_record_is_corruption() {
        let mut data = build(&[(b"a", b"1"), (b"b", b"22")], 4096);
        // Overstate the length of "b"'s value so it runs past the data section
        data[15] = 9;
        let table = Table::open(data).unwrap();

        assert_eq!(table.get(b"a").unwrap(), b"1");
        assert!(table.get(b"b").unwrap_err().is_corruption());

        let mut iter = table.iter().unwrap();
        assert!(iter.advance());
        assert_eq!(iter.key(), b"a");
        assert!(!iter.advance());
        assert!(iter.take_error().unwrap().is_corruption());
    }
}
