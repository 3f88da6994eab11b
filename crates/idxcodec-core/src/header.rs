//! The fixed 16-byte IDX3 header.
//!
//! ```text
//! offset  width  field         encoding
//! 0       4      magic         big-endian u32 (0x00000803 for IDX3)
//! 4       4      record_count  big-endian u32
//! 8       4      row_count     big-endian u32
//! 12      4      column_count  big-endian u32
//! 16+     ...    records       row-major, one byte per element
//! ```

use crate::endian::{from_disk, to_disk};
use crate::error::{DecodeError, WriteError};
use crate::io::read_full;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};

/// Documented magic number of an IDX3 (unsigned byte, 3 dimensions) file.
pub const IDX3_MAGIC: u32 = 0x0000_0803;

/// Encoded size of the header in bytes.
pub const HEADER_LEN: usize = 16;

/// Decoded header. Fields are always in host order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeaderRecord {
    pub magic: u32,
    pub record_count: u32,
    pub row_count: u32,
    pub column_count: u32,
}

impl HeaderRecord {
    pub fn new(magic: u32, record_count: u32, row_count: u32, column_count: u32) -> Self {
        Self {
            magic,
            record_count,
            row_count,
            column_count,
        }
    }

    /// Header for an IDX3 dataset of `record_count` records of `rows x columns`.
    pub fn idx3(record_count: u32, row_count: u32, column_count: u32) -> Self {
        Self::new(IDX3_MAGIC, record_count, row_count, column_count)
    }

    /// Decodes a header from the stream's current position.
    ///
    /// Consumes exactly 16 bytes on success. The magic number is *not*
    /// checked here; callers that care use [`HeaderRecord::check_magic`].
    pub fn decode<R: Read + ?Sized>(source: &mut R) -> Result<Self, DecodeError> {
        let mut raw = [0u8; HEADER_LEN];
        let got = read_full(source, &mut raw)?;
        if got < HEADER_LEN {
            return Err(DecodeError::ShortRead {
                expected: HEADER_LEN,
                actual: got,
            });
        }

        let field = |i: usize| {
            let word = [raw[i * 4], raw[i * 4 + 1], raw[i * 4 + 2], raw[i * 4 + 3]];
            from_disk(u32::from_ne_bytes(word))
        };

        Ok(Self {
            magic: field(0),
            record_count: field(1),
            row_count: field(2),
            column_count: field(3),
        })
    }

    /// On-disk representation: four big-endian words.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        let words = [self.magic, self.record_count, self.row_count, self.column_count];
        for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&to_disk(word).to_ne_bytes());
        }
        out
    }

    /// Writes the 16-byte header. Only fails if the sink does.
    pub fn encode<W: Write + ?Sized>(&self, sink: &mut W) -> Result<(), WriteError> {
        sink.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Bytes per record, `row_count * column_count`.
    ///
    /// Returns `None` when the product overflows `usize`.
    pub fn record_size(&self) -> Option<usize> {
        (self.row_count as usize).checked_mul(self.column_count as usize)
    }

    /// Size of the whole file this header describes, if it fits in a `u64`.
    pub fn dataset_len(&self) -> Option<u64> {
        let body = (self.record_size()? as u64).checked_mul(self.record_count as u64)?;
        body.checked_add(HEADER_LEN as u64)
    }

    /// Opt-in magic validation. The codec itself never enforces this.
    pub fn check_magic(&self, expected: u32) -> Result<(), DecodeError> {
        if self.magic == expected {
            Ok(())
        } else {
            Err(DecodeError::UnexpectedMagic {
                expected,
                found: self.magic,
            })
        }
    }
}

impl fmt::Display for HeaderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "magic: {} records: {} rows: {} columns: {}",
            self.magic, self.record_count, self.row_count, self.column_count
        )
    }
}
