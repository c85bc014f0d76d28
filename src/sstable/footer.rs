//! SSTable trailer.
//!
//! The trailer is the last 4 bytes of a table: the little-endian `u32`
//! offset where the index section begins. Everything before that offset is
//! the data section.

use crate::error::{Error, Result};
use crate::sstable::source::ByteSource;
use crate::sstable::FOOTER_SIZE;
use std::io::Write;

/// Trailer locating the sparse index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    /// Start of the index section, which is also the data section length
    pub index_offset: u32,
}

impl Footer {
    /// Create a new Footer
    pub fn new(index_offset: u32) -> Self {
        Self { index_offset }
    }

    /// Encode the footer to bytes (4 bytes)
    pub fn encode(&self) -> [u8; FOOTER_SIZE] {
        self.index_offset.to_le_bytes()
    }

    /// Decode a footer from bytes
    pub fn decode(data: &[u8]) -> Result<Self> {
        let bytes: [u8; FOOTER_SIZE] = data.try_into().map_err(|_| {
            Error::corruption(format!(
                "Footer size mismatch: expected {}, got {}",
                FOOTER_SIZE,
                data.len()
            ))
        })?;
        Ok(Self { index_offset: u32::from_le_bytes(bytes) })
    }

    /// Write the footer to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.encode())?;
        Ok(())
    }

    /// Read the footer from the last bytes of a source of `size` bytes
    pub fn read_from<S: ByteSource + ?Sized>(source: &S, size: u64) -> Result<Self> {
        let position = size.checked_sub(FOOTER_SIZE as u64).ok_or_else(|| {
            Error::corruption(format!("{} byte source is too small to hold a trailer", size))
        })?;

        let mut buf = [0u8; FOOTER_SIZE];
        source.read_exact_at(position, &mut buf)?;
        Self::decode(&buf)
    }
}
