//! SSTable builder implementation.
//!
//! Streams sorted key-value pairs into the table format in a single pass.
//! The sparse index is built while the data section is written and lands
//! after it, followed by the trailer.

use crate::config::Options;
use crate::error::{Error, Result};
use crate::iterator::KvIterator;
use crate::sstable::block::{put_record, record_size};
use crate::sstable::footer::Footer;
use crate::sstable::index::IndexBuilder;
use crate::sstable::FOOTER_SIZE;
use crate::store::Store;
use bytes::BytesMut;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// What a finished table contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSummary {
    /// Records in the data section
    pub num_entries: u64,
    /// Checkpoints in the sparse index
    pub index_entries: usize,
    /// Length of the data section, which is also where the index starts
    pub data_len: u32,
    /// Bytes written in total, trailer included
    pub total_len: u64,
}

/// TableBuilder writes a table to any byte sink.
///
/// Usage:
/// ```no_run
/// use sortedkv::sstable::TableBuilder;
/// use sortedkv::Options;
///
/// let mut builder = TableBuilder::create("table.sst", &Options::default()).unwrap();
/// builder.add(b"key1", b"value1").unwrap();
/// builder.add(b"key2", b"value2").unwrap();
/// builder.finish().unwrap();
/// ```
pub struct TableBuilder<W: Write> {
    writer: W,
    index: IndexBuilder,
    /// Scratch buffer for the record being written
    buf: BytesMut,
    last_key: Vec<u8>,
    /// Running offset into the data section
    offset: u32,
    num_entries: u64,
    /// Set once a write to the sink fails; the sink holds a partial record
    failed: bool,
}

impl TableBuilder<BufWriter<File>> {
    /// Create a builder writing to a new file at `path`
    pub fn create<P: AsRef<Path>>(path: P, options: &Options) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), options)
    }
}

impl<W: Write> TableBuilder<W> {
    /// Create a new TableBuilder over `writer`
    pub fn new(writer: W, options: &Options) -> Result<Self> {
        options.validate()?;

        let block_size = u32::try_from(options.block_size)
            .map_err(|_| Error::invalid_argument("block_size must fit in 32 bits"))?;

        Ok(Self {
            writer,
            index: IndexBuilder::new(block_size),
            buf: BytesMut::new(),
            last_key: Vec::new(),
            offset: 0,
            num_entries: 0,
            failed: false,
        })
    }

    /// Add a key-value pair to the table.
    ///
    /// Keys must be added in strictly increasing order.
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_not_failed()?;
        if self.num_entries > 0 && key <= self.last_key.as_slice() {
            return Err(Error::invalid_argument("Keys must be added in strictly increasing order"));
        }

        if u32::try_from(key.len()).is_err() || u32::try_from(value.len()).is_err() {
            return Err(Error::invalid_argument("Key and value lengths must fit in 32 bits"));
        }
        let size = record_size(key, value);
        let next_offset = u32::try_from(size)
            .ok()
            .and_then(|size| self.offset.checked_add(size))
            .ok_or_else(|| Error::invalid_argument("Data section would exceed 4GB"))?;

        self.buf.clear();
        put_record(&mut self.buf, key, value);
        if let Err(e) = self.writer.write_all(&self.buf) {
            self.failed = true;
            return Err(e.into());
        }

        self.index.observe(key, self.offset);

        self.offset = next_offset;
        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        self.num_entries += 1;
        Ok(())
    }

    /// Write the index section and trailer, then flush the sink.
    pub fn finish(mut self) -> Result<TableSummary> {
        self.check_not_failed()?;
        let index = self.index.finish();

        self.buf.clear();
        index.encode_to(&mut self.buf);
        self.writer.write_all(&self.buf)?;

        Footer::new(self.offset).write_to(&mut self.writer)?;
        self.writer.flush()?;

        let summary = TableSummary {
            num_entries: self.num_entries,
            index_entries: index.len(),
            data_len: self.offset,
            total_len: self.offset as u64 + self.buf.len() as u64 + FOOTER_SIZE as u64,
        };
        log::debug!(
            "Flushed table: {} entries, {} index entries, {} data bytes, {} bytes total",
            summary.num_entries,
            summary.index_entries,
            summary.data_len,
            summary.total_len
        );
        Ok(summary)
    }

    fn check_not_failed(&self) -> Result<()> {
        if self.failed {
            return Err(Error::invalid_argument("Table builder already failed on a write"));
        }
        Ok(())
    }

    /// Number of records added so far
    pub fn num_entries(&self) -> u64 {
        self.num_entries
    }

    /// Bytes of data section written so far
    pub fn current_size(&self) -> u32 {
        self.offset
    }
}

/// Streams `iter` to the end into a table written to `sink`.
///
/// A deferred error reported by the iterator fails the flush after the
/// iterator is exhausted; nothing is finished in that case.
pub fn flush<I, W>(iter: &mut I, sink: W, options: &Options) -> Result<TableSummary>
where
    I: KvIterator + ?Sized,
    W: Write,
{
    let mut builder = TableBuilder::new(sink, options)?;
    while iter.advance() {
        builder.add(iter.key(), iter.value())?;
    }
    if let Some(err) = iter.take_error() {
        return Err(err);
    }
    builder.finish()
}

/// Exports every entry of `store` into a table written to `sink`.
pub fn flush_store<S, W>(store: &S, sink: W, options: &Options) -> Result<TableSummary>
where
    S: Store + ?Sized,
    W: Write,
{
    let mut iter = store.scan_all()?;
    flush(&mut iter, sink, options)
}
