//! `DatasetReader`: drives one sequential pass over an IDX3 stream.
//!
//! ```text
//! Unopened ─open─▶ HeaderPending ─read_header─▶ StreamingRecords ─(last record)─▶ Exhausted
//!     └──────────────────┴────────────(any error)────────┴──────────────────────▶ Failed
//! ```

use crate::error::{DecodeError, OpenError};
use crate::header::HeaderRecord;
use crate::record::RecordBuffer;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Default buffer size for file-backed readers and writers.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Upper bound on up-front allocation in [`DatasetReader::read_all`], so a
/// corrupt record count cannot trigger a huge reservation.
const MAX_PREALLOC_RECORDS: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Unopened,
    HeaderPending,
    StreamingRecords,
    Exhausted,
    Failed,
}

impl ReaderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReaderState::Unopened => "unopened",
            ReaderState::HeaderPending => "awaiting header",
            ReaderState::StreamingRecords => "streaming records",
            ReaderState::Exhausted => "exhausted",
            ReaderState::Failed => "failed",
        }
    }
}

impl fmt::Display for ReaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sequential reader over one dataset.
pub struct DatasetReader<R> {
    source: Option<R>,
    state: ReaderState,
    header: Option<HeaderRecord>,
    records_read: u32,
}

impl<R> Default for DatasetReader<R> {
    fn default() -> Self {
        Self {
            source: None,
            state: ReaderState::Unopened,
            header: None,
            records_read: 0,
        }
    }
}

impl<R: Read> DatasetReader<R> {
    /// A reader with no source attached yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reader over an already-open source positioned at offset 0.
    pub fn from_reader(source: R) -> Self {
        Self {
            source: Some(source),
            state: ReaderState::HeaderPending,
            header: None,
            records_read: 0,
        }
    }

    /// Attaches a source to an unopened reader.
    pub fn attach(&mut self, source: R) -> Result<(), OpenError> {
        if self.state != ReaderState::Unopened {
            return Err(OpenError::AlreadyOpen {
                state: self.state.as_str(),
            });
        }
        self.source = Some(source);
        self.state = ReaderState::HeaderPending;
        Ok(())
    }

    /// Decodes the header and moves to record streaming.
    pub fn read_header(&mut self) -> Result<HeaderRecord, DecodeError> {
        if self.state != ReaderState::HeaderPending {
            return Err(DecodeError::InvalidState {
                operation: "read the header",
                state: self.state.as_str(),
            });
        }
        let source = self.source.as_mut().ok_or(DecodeError::InvalidState {
            operation: "read the header",
            state: ReaderState::Unopened.as_str(),
        })?;

        match HeaderRecord::decode(source) {
            Ok(header) => {
                debug!("DatasetReader: header decoded ({})", header);
                self.header = Some(header);
                self.state = if header.record_count == 0 {
                    ReaderState::Exhausted
                } else {
                    ReaderState::StreamingRecords
                };
                Ok(header)
            }
            Err(e) => {
                warn!("DatasetReader: header decode failed: {}", e);
                self.state = ReaderState::Failed;
                Err(e)
            }
        }
    }

    /// Reads the next record in file order.
    ///
    /// A short or partial record moves the reader to `Failed`; nothing read
    /// in this pass should be trusted after that.
    pub fn next_record(&mut self) -> Result<RecordBuffer, DecodeError> {
        let header = match (self.state, self.header) {
            (ReaderState::StreamingRecords, Some(h)) => h,
            (ReaderState::Exhausted, Some(h)) => {
                return Err(DecodeError::NoMoreRecords {
                    count: h.record_count,
                })
            }
            (state, _) => {
                return Err(DecodeError::InvalidState {
                    operation: "read a record",
                    state: state.as_str(),
                })
            }
        };
        let index = self.records_read;
        let source = self.source.as_mut().ok_or(DecodeError::InvalidState {
            operation: "read a record",
            state: ReaderState::Unopened.as_str(),
        })?;

        match read_record(source, &header, index) {
            Ok(record) => {
                self.records_read += 1;
                if self.records_read == header.record_count {
                    debug!("DatasetReader: all {} records read", header.record_count);
                    self.state = ReaderState::Exhausted;
                }
                Ok(record)
            }
            Err(e) => {
                warn!("DatasetReader: record {} failed: {}", index, e);
                self.state = ReaderState::Failed;
                Err(e)
            }
        }
    }

    /// Iterator over the remaining records. Stops after the first error.
    ///
    /// The header must already have been read.
    pub fn records(&mut self) -> Records<'_, R> {
        Records { reader: self }
    }

    /// Reads the header (if still pending) and every record into memory.
    pub fn read_all(&mut self) -> Result<Vec<RecordBuffer>, DecodeError> {
        let header = match self.header {
            Some(h) => h,
            None => self.read_header()?,
        };
        if self.state == ReaderState::Failed {
            return Err(DecodeError::InvalidState {
                operation: "read all records",
                state: self.state.as_str(),
            });
        }
        let remaining = header.record_count.saturating_sub(self.records_read) as usize;
        let mut out = Vec::with_capacity(remaining.min(MAX_PREALLOC_RECORDS));
        for record in self.records() {
            out.push(record?);
        }
        Ok(out)
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn header(&self) -> Option<&HeaderRecord> {
        self.header.as_ref()
    }

    pub fn records_read(&self) -> u32 {
        self.records_read
    }

    /// Releases the reader, handing back the underlying source.
    pub fn into_inner(self) -> Option<R> {
        self.source
    }
}

impl DatasetReader<BufReader<File>> {
    /// Opens `path` for binary read.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), OpenError> {
        self.open_with_capacity(path, DEFAULT_BUFFER_CAPACITY)
    }

    pub fn open_with_capacity(
        &mut self,
        path: impl AsRef<Path>,
        capacity: usize,
    ) -> Result<(), OpenError> {
        if self.state != ReaderState::Unopened {
            return Err(OpenError::AlreadyOpen {
                state: self.state.as_str(),
            });
        }
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| {
            self.state = ReaderState::Failed;
            OpenError::FileNotOpen {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!("DatasetReader: opened '{}'", path.display());
        self.attach(BufReader::with_capacity(capacity, file))
    }

    /// Shorthand for `new()` followed by `open(path)`.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        let mut reader = Self::new();
        reader.open(path)?;
        Ok(reader)
    }
}

fn read_record<R: Read + ?Sized>(
    source: &mut R,
    header: &HeaderRecord,
    index: u32,
) -> Result<RecordBuffer, DecodeError> {
    let mut record = RecordBuffer::unfilled(header.column_count, header.row_count)?;
    let outcome = record.read_from(source)?;
    if outcome.bytes_read == 0 {
        // Clean end-of-stream before the declared count was reached.
        return Err(DecodeError::ShortRead {
            expected: outcome.requested,
            actual: 0,
        });
    }
    if !outcome.is_complete() {
        return Err(DecodeError::SizeMismatch {
            index: index as u64,
            expected: outcome.requested,
            actual: outcome.bytes_read,
        });
    }
    Ok(record)
}

/// Borrowing iterator returned by [`DatasetReader::records`].
pub struct Records<'a, R> {
    reader: &'a mut DatasetReader<R>,
}

impl<R: Read> Iterator for Records<'_, R> {
    type Item = Result<RecordBuffer, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reader.state != ReaderState::StreamingRecords {
            return None;
        }
        Some(self.reader.next_record())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(header: HeaderRecord, body: &[u8]) -> Vec<u8> {
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn walks_states_to_exhausted() {
        let bytes = dataset(HeaderRecord::idx3(2, 1, 2), &[1, 2, 3, 4]);
        let mut reader = DatasetReader::from_reader(bytes.as_slice());
        assert_eq!(reader.state(), ReaderState::HeaderPending);

        reader.read_header().unwrap();
        assert_eq!(reader.state(), ReaderState::StreamingRecords);

        assert_eq!(reader.next_record().unwrap().as_bytes(), &[1, 2]);
        assert_eq!(reader.next_record().unwrap().as_bytes(), &[3, 4]);
        assert_eq!(reader.state(), ReaderState::Exhausted);

        assert!(matches!(
            reader.next_record(),
            Err(DecodeError::NoMoreRecords { count: 2 })
        ));
    }

    #[test]
    fn record_before_header_is_rejected() {
        let bytes = dataset(HeaderRecord::idx3(1, 1, 1), &[7]);
        let mut reader = DatasetReader::from_reader(bytes.as_slice());
        assert!(matches!(
            reader.next_record(),
            Err(DecodeError::InvalidState { .. })
        ));
    }

    #[test]
    fn unopened_reader_cannot_read() {
        let mut reader: DatasetReader<&[u8]> = DatasetReader::new();
        assert_eq!(reader.state(), ReaderState::Unopened);
        assert!(reader.read_header().is_err());
        reader.attach(&[][..]).unwrap();
        assert_eq!(reader.state(), ReaderState::HeaderPending);
        assert!(reader.attach(&[][..]).is_err());
    }

    #[test]
    fn partial_record_fails_the_pass() {
        // Second record is one byte short.
        let bytes = dataset(HeaderRecord::idx3(2, 2, 2), &[1, 2, 3, 4, 5, 6, 7]);
        let mut reader = DatasetReader::from_reader(bytes.as_slice());
        reader.read_header().unwrap();
        reader.next_record().unwrap();
        match reader.next_record() {
            Err(DecodeError::SizeMismatch {
                index,
                expected,
                actual,
            }) => {
                assert_eq!((index, expected, actual), (1, 4, 3));
            }
            other => panic!("expected SizeMismatch, got {other:?}"),
        }
        assert_eq!(reader.state(), ReaderState::Failed);
        assert!(matches!(
            reader.next_record(),
            Err(DecodeError::InvalidState { .. })
        ));
    }

    #[test]
    fn missing_records_are_a_short_read() {
        let bytes = dataset(HeaderRecord::idx3(3, 1, 1), &[1]);
        let mut reader = DatasetReader::from_reader(bytes.as_slice());
        reader.read_header().unwrap();
        reader.next_record().unwrap();
        assert!(matches!(
            reader.next_record(),
            Err(DecodeError::ShortRead {
                expected: 1,
                actual: 0
            })
        ));
        assert_eq!(reader.state(), ReaderState::Failed);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn huge_declared_record_is_a_size_mismatch() {
        let bytes = dataset(HeaderRecord::idx3(1, 1 << 20, 1 << 20), &[1, 2, 3]);
        let mut reader = DatasetReader::from_reader(bytes.as_slice());
        reader.read_header().unwrap();
        match reader.next_record() {
            Err(DecodeError::SizeMismatch {
                index,
                expected,
                actual,
            }) => assert_eq!((index, expected, actual), (0, 1 << 40, 3)),
            other => panic!("expected SizeMismatch, got {other:?}"),
        }
        assert_eq!(reader.state(), ReaderState::Failed);
    }

    #[test]
    fn zero_dimensions_fail_on_first_record() {
        let bytes = dataset(HeaderRecord::idx3(1, 0, 28), &[]);
        let mut reader = DatasetReader::from_reader(bytes.as_slice());
        reader.read_header().unwrap();
        assert!(matches!(
            reader.next_record(),
            Err(DecodeError::InvalidDimensions { rows: 0, columns: 28 })
        ));
    }

    #[test]
    fn empty_dataset_is_immediately_exhausted() {
        let bytes = dataset(HeaderRecord::idx3(0, 28, 28), &[]);
        let mut reader = DatasetReader::from_reader(bytes.as_slice());
        reader.read_header().unwrap();
        assert_eq!(reader.state(), ReaderState::Exhausted);
        assert!(reader.read_all().unwrap().is_empty());
    }

    #[test]
    fn read_all_collects_in_order() {
        let bytes = dataset(HeaderRecord::idx3(3, 1, 1), &[9, 8, 7]);
        let mut reader = DatasetReader::from_reader(bytes.as_slice());
        let all: Vec<u8> = reader
            .read_all()
            .unwrap()
            .into_iter()
            .flat_map(RecordBuffer::into_bytes)
            .collect();
        assert_eq!(all, vec![9, 8, 7]);
    }

    #[test]
    fn header_failure_is_terminal() {
        let mut reader = DatasetReader::from_reader(&[0u8, 0, 8][..]);
        assert!(matches!(
            reader.read_header(),
            Err(DecodeError::ShortRead { .. })
        ));
        assert_eq!(reader.state(), ReaderState::Failed);
        assert!(reader.header().is_none());
    }

    #[test]
    fn missing_file_reports_path() {
        let mut reader: DatasetReader<BufReader<File>> = DatasetReader::new();
        let err = reader.open("/definitely/not/here.idx3-ubyte").unwrap_err();
        assert!(matches!(err, OpenError::FileNotOpen { .. }));
        assert!(err.to_string().contains("here.idx3-ubyte"));
    }
}
