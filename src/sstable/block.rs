//! Record decoding for byte windows of the data section.
//!
//! A block here is whatever span of the data section a lookup resolves to:
//! one checkpoint-to-checkpoint block for a point lookup, or several
//! adjacent ones for a range scan. It holds whole records back to back:
//!
//! ```text
//! [key_len: u32][key: bytes][value_len: u32][value: bytes]
//! ...
//! ```
//!
//! A length prefix or field that runs past the end of the window is a
//! format violation and stops the iterator with a corrupt table error.

use crate::error::{Error, Result};
use crate::iterator::KvIterator;
use crate::sstable::LEN_SIZE;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Appends one data record to `buf`.
pub(crate) fn put_record(buf: &mut BytesMut, key: &[u8], value: &[u8]) {
    buf.put_u32_le(key.len() as u32);
    buf.put_slice(key);
    buf.put_u32_le(value.len() as u32);
    buf.put_slice(value);
}

/// Encoded size of one data record.
pub(crate) fn record_size(key: &[u8], value: &[u8]) -> usize {
    2 * LEN_SIZE + key.len() + value.len()
}

/// Splits a `u32` length prefix and the field it describes off `data`.
pub(crate) fn take_prefixed(data: &mut Bytes, what: &str) -> Result<Bytes> {
    let len = take_u32(data, what)? as usize;
    if data.remaining() < len {
        return Err(Error::corruption(format!(
            "{} needs {} bytes but only {} remain",
            what,
            len,
            data.remaining()
        )));
    }
    Ok(data.split_to(len))
}

/// Reads a little-endian `u32` off `data`.
pub(crate) fn take_u32(data: &mut Bytes, what: &str) -> Result<u32> {
    if data.remaining() < LEN_SIZE {
        return Err(Error::corruption(format!(
            "truncated {} length: {} of {} bytes",
            what,
            data.remaining(),
            LEN_SIZE
        )));
    }
    Ok(data.get_u32_le())
}

/// A window of encoded data records.
#[derive(Debug, Clone)]
pub struct Block {
    data: Bytes,
    /// Table offset of the first byte, used in error messages
    offset: u32,
}

impl Block {
    /// Create a new Block over `data`, which starts at table offset `offset`
    pub fn new(data: Bytes, offset: u32) -> Self {
        Self { data, offset }
    }

    /// Table offset of the first record
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Size of the window in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Create an iterator over the records
    pub fn iter(&self) -> BlockIterator {
        BlockIterator::new(self.clone())
    }

    /// Get the raw data
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Iterator over the records of a block.
///
/// Keys and values are zero-copy slices of the block's buffer.
pub struct BlockIterator {
    block: Block,
    /// Undecoded tail of the block
    rest: Bytes,
    key: Bytes,
    value: Bytes,
    valid: bool,
    error: Option<Error>,
}

impl BlockIterator {
    fn new(block: Block) -> Self {
        let rest = block.data.clone();
        Self { block, rest, key: Bytes::new(), value: Bytes::new(), valid: false, error: None }
    }

    /// Table offset of the next undecoded byte
    fn position(&self) -> usize {
        self.block.offset as usize + self.block.data.len() - self.rest.len()
    }

    fn decode_next(&mut self) -> Result<(Bytes, Bytes)> {
        let key = take_prefixed(&mut self.rest, "key")?;
        let value = take_prefixed(&mut self.rest, "value")?;
        Ok((key, value))
    }
}

impl KvIterator for BlockIterator {
    fn advance(&mut self) -> bool {
        if !self.rest.has_remaining() {
            self.valid = false;
            return false;
        }

        let position = self.position();
        match self.decode_next() {
            Ok((key, value)) => {
                self.key = key;
                self.value = value;
                self.valid = true;
            }
            Err(err) => {
                let msg = match err {
                    Error::CorruptTable(msg) => msg,
                    other => other.to_string(),
                };
                self.error = Some(Error::corruption(format!(
                    "record at offset {}: {}",
                    position, msg
                )));
                self.rest.clear();
                self.valid = false;
            }
        }
        self.valid
    }

    fn valid(&self) -> bool {
        self.valid
    }

    fn key(&self) -> &[u8] {
        if self.valid {
            &self.key
        } else {
            &[]
        }
    }

    fn value(&self) -> &[u8] {
        if self.valid {
            &self.value
        } else {
            &[]
        }
    }

    fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(entries: &[(&[u8], &[u8])]) -> Bytes {
        let mut buf = BytesMut::new();
        for (key, value) in entries {
            put_record(&mut buf, key, value);
        }
        buf.freeze()
    }

    #[test]
    fn test_record_layout() {
        let data = encode(&[(b"ab", b"xyz")]);
        assert_eq!(data.len(), record_size(b"ab", b"xyz"));
        assert_eq!(&data[..], &[2, 0, 0, 0, b'a', b'b', 3, 0, 0, 0, b'x', b'y', b'z']);
    }

    #[test]
    fn test_block_iterator() {
        let block = Block::new(encode(&[(b"apple", b"red"), (b"banana", b""), (b"", b"empty")]), 0);
        let mut iter = block.iter();

        assert!(!iter.valid());
        assert!(iter.advance());
        assert_eq!(iter.key(), b"apple");
        assert_eq!(iter.value(), b"red");

        assert!(iter.advance());
        assert_eq!(iter.key(), b"banana");
        assert_eq!(iter.value(), b"");

        assert!(iter.advance());
        assert_eq!(iter.key(), b"");
        assert_eq!(iter.value(), b"empty");

        assert!(!iter.advance());
        assert!(iter.error().is_none());
    }

    #[test]
    fn test_block_truncated_value() {
        let mut data = encode(&[(b"k1", b"v1"), (b"k2", b"value2")]).to_vec();
        data.truncate(data.len() - 3);
        let block = Block::new(Bytes::from(data), 100);
        let mut iter = block.iter();

        assert!(iter.advance());
        assert_eq!(iter.key(), b"k1");
        assert!(!iter.advance());
        assert_eq!(iter.key(), b"");

        let err = iter.take_error().unwrap();
        assert!(err.is_corruption());
        // Second record starts 12 bytes into a block at offset 100
        assert!(err.to_string().contains("offset 112"), "{}", err);
    }

    #[test]
    fn test_block_truncated_length_prefix() {
        let block = Block::new(Bytes::from_static(&[1, 0]), 0);
        let mut iter = block.iter();
        assert!(!iter.advance());
        assert!(iter.error().unwrap().is_corruption());
    }

    #[test]
    fn test_take_u32() {
        let mut data = Bytes::from_static(&[7, 0, 0, 0, 1]);
        assert_eq!(take_u32(&mut data, "offset").unwrap(), 7);
        assert!(take_u32(&mut data, "offset").is_err());
    }
}
