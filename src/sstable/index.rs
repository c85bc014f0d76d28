//! Sparse index for SSTable.
//!
//! The index holds one `(key, offset)` pair per checkpoint: the first record
//! of the table, the first record at or after every `block_size` bytes of
//! data, and the last record of the table. Offsets and keys are both
//! strictly increasing, so a lookup is a binary search over the keys.

use crate::error::{Error, Result};
use crate::sstable::block::{take_prefixed, take_u32};
use crate::sstable::LEN_SIZE;
use bytes::{BufMut, Bytes, BytesMut};

/// A checkpoint: the key of the record that starts at `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// First key of the block
    pub key: Vec<u8>,
    /// Offset of the block in the data section
    pub offset: u32,
}

impl IndexEntry {
    /// Create a new IndexEntry
    pub fn new(key: Vec<u8>, offset: u32) -> Self {
        Self { key, offset }
    }

    /// Encoded size of this entry in the index section
    pub fn encoded_len(&self) -> usize {
        2 * LEN_SIZE + self.key.len()
    }
}

/// Byte span of the data section to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle {
    /// Start offset
    pub offset: u32,
    /// Length in bytes
    pub size: u32,
}

impl BlockHandle {
    /// Create a new BlockHandle
    pub fn new(offset: u32, size: u32) -> Self {
        Self { offset, size }
    }

    /// Offset one past the last byte of the block
    pub fn end_offset(&self) -> u32 {
        self.offset + self.size
    }
}

/// Parsed sparse index, held in memory by an open table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseIndex {
    entries: Vec<IndexEntry>,
}

impl SparseIndex {
    /// Wraps entries already known to be ordered.
    pub(crate) fn from_entries(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    /// Decodes an index section that describes a data section of `data_len`
    /// bytes.
    ///
    /// Every violation of the format is reported as a corrupt table: a
    /// truncated record, an offset outside the data section, offsets or keys
    /// that do not strictly increase, or a data section with no checkpoint
    /// at offset 0.
    pub fn decode(mut data: Bytes, data_len: u32) -> Result<Self> {
        let mut entries: Vec<IndexEntry> = Vec::new();

        while !data.is_empty() {
            let at = entries.len();
            let key = take_prefixed(&mut data, "index key")?;
            let offset = take_u32(&mut data, "index offset")?;

            if offset >= data_len {
                return Err(Error::corruption(format!(
                    "index entry {} points at offset {} past the {} byte data section",
                    at, offset, data_len
                )));
            }
            if let Some(prev) = entries.last() {
                if offset <= prev.offset {
                    return Err(Error::corruption(format!(
                        "index offsets not increasing at entry {}: {} after {}",
                        at, offset, prev.offset
                    )));
                }
                if key[..] <= prev.key[..] {
                    return Err(Error::corruption(format!(
                        "index keys not increasing at entry {}",
                        at
                    )));
                }
            } else if offset != 0 {
                return Err(Error::corruption(format!(
                    "first index entry points at offset {} instead of 0",
                    offset
                )));
            }

            entries.push(IndexEntry::new(key.to_vec(), offset));
        }

        if entries.is_empty() && data_len > 0 {
            return Err(Error::corruption(format!(
                "{} byte data section has no index entries",
                data_len
            )));
        }

        Ok(Self { entries })
    }

    /// Appends the encoded index section to `buf`.
    pub fn encode_to(&self, buf: &mut BytesMut) {
        for entry in &self.entries {
            buf.put_u32_le(entry.key.len() as u32);
            buf.put_slice(&entry.key);
            buf.put_u32_le(entry.offset);
        }
    }

    /// Encoded size of the index section.
    pub fn encoded_len(&self) -> usize {
        self.entries.iter().map(IndexEntry::encoded_len).sum()
    }

    /// Finds the block that would hold `key`.
    ///
    /// The block starts at the last checkpoint whose key is `<= key` and ends
    /// at the next checkpoint, or at `data_len` for the final block. Returns
    /// `None` when `key` sorts before the first checkpoint.
    pub fn find_block(&self, key: &[u8], data_len: u32) -> Option<BlockHandle> {
        let i = self.entries.partition_point(|e| e.key.as_slice() <= key);
        if i == 0 {
            return None;
        }

        let start = self.entries[i - 1].offset;
        let end = self.entries.get(i).map_or(data_len, |e| e.offset);
        Some(BlockHandle::new(start, end - start))
    }

    /// Key of the first checkpoint, which is the smallest key in the table.
    pub fn first_key(&self) -> Option<&[u8]> {
        self.entries.first().map(|e| e.key.as_slice())
    }

    /// Key of the last checkpoint, which is the largest key in the table.
    pub fn last_key(&self) -> Option<&[u8]> {
        self.entries.last().map(|e| e.key.as_slice())
    }

    /// Number of checkpoints
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index has no checkpoints
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All checkpoints in ascending order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

/// Builds the sparse index while records stream into the data section.
#[derive(Debug)]
pub struct IndexBuilder {
    entries: Vec<IndexEntry>,
    block_size: u32,
    /// Offset at or after which the next record becomes a checkpoint
    next_checkpoint: u32,
    /// Key and offset of the most recent record
    last: Option<(Vec<u8>, u32)>,
}

impl IndexBuilder {
    /// Create a new IndexBuilder with the given checkpoint granularity
    pub fn new(block_size: u32) -> Self {
        Self { entries: Vec::new(), block_size, next_checkpoint: 0, last: None }
    }

    /// Notes a record about to be written at `offset`.
    pub fn observe(&mut self, key: &[u8], offset: u32) {
        if offset >= self.next_checkpoint {
            self.entries.push(IndexEntry::new(key.to_vec(), offset));
            self.next_checkpoint = offset.saturating_add(self.block_size);
        }

        match &mut self.last {
            Some((last_key, last_offset)) => {
                last_key.clear();
                last_key.extend_from_slice(key);
                *last_offset = offset;
            }
            None => self.last = Some((key.to_vec(), offset)),
        }
    }

    /// Number of checkpoints recorded so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been observed yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Closes the index with an entry for the final record.
    pub fn finish(mut self) -> SparseIndex {
        if let Some((key, offset)) = self.last.take() {
            let covered = self.entries.last().is_some_and(|e| e.offset == offset);
            if !covered {
                self.entries.push(IndexEntry::new(key, offset));
            }
        }
        SparseIndex::from_entries(self.entries)
    }
}
