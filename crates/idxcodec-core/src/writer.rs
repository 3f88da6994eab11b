//! `DatasetWriter`: the mirror image of [`DatasetReader`](crate::reader::DatasetReader).
//!
//! No retry happens at this layer; every sink failure is returned as-is.

use crate::error::{OpenError, WriteError};
use crate::header::HeaderRecord;
use crate::reader::DEFAULT_BUFFER_CAPACITY;
use crate::record::RecordBuffer;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Unopened,
    HeaderPending,
    StreamingRecords,
    Failed,
}

impl WriterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriterState::Unopened => "unopened",
            WriterState::HeaderPending => "awaiting header",
            WriterState::StreamingRecords => "streaming records",
            WriterState::Failed => "failed",
        }
    }
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sequential writer for one dataset.
pub struct DatasetWriter<W> {
    sink: Option<W>,
    state: WriterState,
    header: Option<HeaderRecord>,
    records_written: u32,
}

impl<W> Default for DatasetWriter<W> {
    fn default() -> Self {
        Self {
            sink: None,
            state: WriterState::Unopened,
            header: None,
            records_written: 0,
        }
    }
}

impl<W: Write> DatasetWriter<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A writer over an already-open sink.
    pub fn from_writer(sink: W) -> Self {
        Self {
            sink: Some(sink),
            state: WriterState::HeaderPending,
            header: None,
            records_written: 0,
        }
    }

    pub fn attach(&mut self, sink: W) -> Result<(), OpenError> {
        if self.state != WriterState::Unopened {
            return Err(OpenError::AlreadyOpen {
                state: self.state.as_str(),
            });
        }
        self.sink = Some(sink);
        self.state = WriterState::HeaderPending;
        Ok(())
    }

    pub fn write_header(&mut self, header: &HeaderRecord) -> Result<(), WriteError> {
        let sink = self.sink_for("write the header", WriterState::HeaderPending)?;
        let result = header.encode(sink);
        self.settle(result)?;
        self.header = Some(*header);
        self.state = WriterState::StreamingRecords;
        Ok(())
    }

    /// Appends one record. Its size must match the header's rows x columns,
    /// and no more than `record_count` records are accepted.
    pub fn write_record(&mut self, record: &RecordBuffer) -> Result<(), WriteError> {
        let header = match self.header {
            Some(h) if self.state == WriterState::StreamingRecords => h,
            _ => {
                return Err(WriteError::InvalidState {
                    operation: "write a record",
                    state: self.state.as_str(),
                })
            }
        };
        if self.records_written >= header.record_count {
            return Err(WriteError::TooManyRecords {
                declared: header.record_count,
            });
        }
        let expected = header.record_size().unwrap_or(usize::MAX);
        if record.record_size() != expected {
            return Err(WriteError::DimensionMismatch {
                expected,
                actual: record.record_size(),
            });
        }

        let sink = self.sink_for("write a record", WriterState::StreamingRecords)?;
        let result = record.write_to(sink);
        self.settle(result)?;
        self.records_written += 1;
        Ok(())
    }

    /// Flushes and hands back the sink.
    pub fn finish(mut self) -> Result<W, WriteError> {
        let mut sink = self.sink.take().ok_or(WriteError::InvalidState {
            operation: "finish",
            state: WriterState::Unopened.as_str(),
        })?;
        sink.flush()?;
        debug!(
            "DatasetWriter: finished after {} records",
            self.records_written
        );
        Ok(sink)
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn records_written(&self) -> u32 {
        self.records_written
    }

    fn sink_for(
        &mut self,
        operation: &'static str,
        required: WriterState,
    ) -> Result<&mut W, WriteError> {
        if self.state != required {
            return Err(WriteError::InvalidState {
                operation,
                state: self.state.as_str(),
            });
        }
        self.sink.as_mut().ok_or(WriteError::InvalidState {
            operation,
            state: WriterState::Unopened.as_str(),
        })
    }

    fn settle(&mut self, result: Result<(), WriteError>) -> Result<(), WriteError> {
        if result.is_err() {
            self.state = WriterState::Failed;
        }
        result
    }
}

impl DatasetWriter<BufWriter<File>> {
    /// Creates (or truncates) `path` for binary write.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), OpenError> {
        self.open_with_capacity(path, DEFAULT_BUFFER_CAPACITY)
    }

    pub fn open_with_capacity(
        &mut self,
        path: impl AsRef<Path>,
        capacity: usize,
    ) -> Result<(), OpenError> {
        if self.state != WriterState::Unopened {
            return Err(OpenError::AlreadyOpen {
                state: self.state.as_str(),
            });
        }
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| {
            self.state = WriterState::Failed;
            OpenError::FileNotOpen {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!("DatasetWriter: created '{}'", path.display());
        self.attach(BufWriter::with_capacity(capacity, file))
    }

    pub fn create(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        let mut writer = Self::new();
        writer.open(path)?;
        Ok(writer)
    }
}
