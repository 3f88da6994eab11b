//! One fixed-size record: a `rows x columns` matrix of bytes, row-major.

use crate::endian::{is_swap_needed, swap_bytes};
use crate::error::{DecodeError, WriteError};
use std::io::{Read, Write};

/// Initial buffer reservation for a record being read. The buffer grows with
/// the bytes the source actually delivers, never with the declared size.
const INITIAL_READ_CAPACITY: usize = 64 * 1024;

/// What a single bulk read actually delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Bytes requested, i.e. the record size.
    pub requested: usize,
    /// Bytes the source delivered. Less than `requested` only at end-of-stream.
    pub bytes_read: usize,
}

impl ReadOutcome {
    pub fn is_complete(&self) -> bool {
        self.bytes_read == self.requested
    }
}

/// A single decoded record.
///
/// The record size is fixed at construction and the buffer is filled by one
/// [`read_from`] call.
/// Consumers (viewers, numeric front-ends) get the raw bytes plus the
/// dimensions needed to interpret them as a 2-D grid.
///
/// [`read_from`]: RecordBuffer::read_from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBuffer {
    rows: u32,
    columns: u32,
    size: usize,
    data: Vec<u8>,
    bytes_read: usize,
}

impl RecordBuffer {
    /// Allocates a zeroed record of `columns * rows` bytes.
    pub fn new(columns: u32, rows: u32) -> Result<Self, DecodeError> {
        let mut record = Self::unfilled(columns, rows)?;
        record.data = vec![0; record.size];
        Ok(record)
    }

    /// A record of `columns * rows` bytes with nothing allocated up front.
    ///
    /// The reader builds records this way so that dimensions taken from an
    /// untrusted header never drive an allocation by themselves.
    pub(crate) fn unfilled(columns: u32, rows: u32) -> Result<Self, DecodeError> {
        let size = (columns as usize)
            .checked_mul(rows as usize)
            .filter(|&n| n > 0)
            .ok_or(DecodeError::InvalidDimensions { rows, columns })?;
        Ok(Self {
            rows,
            columns,
            size,
            data: Vec::with_capacity(size.min(INITIAL_READ_CAPACITY)),
            bytes_read: 0,
        })
    }

    /// Wraps existing bytes; `data.len()` must equal `columns * rows`.
    pub fn from_bytes(columns: u32, rows: u32, data: Vec<u8>) -> Result<Self, DecodeError> {
        let mut record = Self::unfilled(columns, rows)?;
        if data.len() != record.size {
            return Err(DecodeError::SizeMismatch {
                index: 0,
                expected: record.size,
                actual: data.len(),
            });
        }
        record.bytes_read = data.len();
        record.data = data;
        Ok(record)
    }

    /// Issues one bulk read of exactly `record_size()` bytes.
    ///
    /// The returned [`ReadOutcome`] must be checked by the caller: any
    /// `bytes_read` other than the record size means the pass is corrupt.
    /// After a partial read, [`as_bytes`](Self::as_bytes) holds exactly the
    /// bytes that arrived.
    pub fn read_from<R: Read + ?Sized>(&mut self, source: &mut R) -> Result<ReadOutcome, DecodeError> {
        self.data.clear();
        self.bytes_read = Read::take(&mut *source, self.size as u64).read_to_end(&mut self.data)?;
        Ok(ReadOutcome {
            requested: self.size,
            bytes_read: self.bytes_read,
        })
    }

    /// Writes the record, element by element in file order.
    pub fn write_to<W: Write + ?Sized>(&self, sink: &mut W) -> Result<(), WriteError> {
        if is_swap_needed() {
            // Identity for u8 elements.
            let swapped: Vec<u8> = self.data.iter().map(|&b| swap_bytes(b)).collect();
            sink.write_all(&swapped)?;
        } else {
            sink.write_all(&self.data)?;
        }
        Ok(())
    }

    pub fn record_size(&self) -> usize {
        self.size
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Row `r` as a slice of `columns` bytes.
    pub fn row(&self, r: u32) -> Option<&[u8]> {
        if r >= self.rows {
            return None;
        }
        let width = self.columns as usize;
        let start = r as usize * width;
        self.data.get(start..start + width)
    }

    /// The element at (`r`, `c`).
    pub fn pixel(&self, r: u32, c: u32) -> Option<u8> {
        if c >= self.columns {
            return None;
        }
        self.row(r).map(|row| row[c as usize])
    }
}
