//! Error types for the IDX3 decode/encode pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening a dataset file.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("File failed to open: {path}: {source}")]
    FileNotOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stream already opened (state: {state})")]
    AlreadyOpen { state: &'static str },
}

/// Errors that can occur while decoding a header or a record.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Short read: expected {expected} bytes, got {actual} bytes")]
    ShortRead { expected: usize, actual: usize },

    #[error("Size mismatch at record {index}: expected {expected} bytes, got {actual} bytes")]
    SizeMismatch {
        index: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid record dimensions: {rows} rows x {columns} columns")]
    InvalidDimensions { rows: u32, columns: u32 },

    #[error("No more records: all {count} declared records have been read")]
    NoMoreRecords { count: u32 },

    #[error("Cannot {operation} while reader is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Unexpected magic number: expected {expected:#010x}, found {found:#010x}")]
    UnexpectedMagic { expected: u32, found: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the output side.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Sink rejected write: {0}")]
    Sink(#[from] std::io::Error),

    #[error("Cannot {operation} while writer is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Record size mismatch: header declares {expected} bytes, record has {actual} bytes")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Header declares {declared} records; refusing to write more")]
    TooManyRecords { declared: u32 },
}

/// Any failure of one dataset pass. This is what crosses into the batch layer.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Open(#[from] OpenError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl DatasetError {
    /// Stable, machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DatasetError::Open(_) => "file_not_open",
            DatasetError::Decode(e) => match e {
                DecodeError::ShortRead { .. } => "short_read",
                DecodeError::SizeMismatch { .. } => "size_mismatch",
                DecodeError::InvalidDimensions { .. } => "invalid_dimensions",
                DecodeError::NoMoreRecords { .. } => "no_more_records",
                DecodeError::InvalidState { .. } => "invalid_state",
                DecodeError::UnexpectedMagic { .. } => "unexpected_magic",
                DecodeError::Io(_) => "read_error",
            },
            DatasetError::Write(_) => "write_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct_per_failure() {
        let short: DatasetError = DecodeError::ShortRead {
            expected: 16,
            actual: 3,
        }
        .into();
        let mismatch: DatasetError = DecodeError::SizeMismatch {
            index: 4,
            expected: 784,
            actual: 10,
        }
        .into();
        let write: DatasetError = WriteError::TooManyRecords { declared: 1 }.into();
        assert_eq!(short.kind(), "short_read");
        assert_eq!(mismatch.kind(), "size_mismatch");
        assert_eq!(write.kind(), "write_error");
    }

    #[test]
    fn size_mismatch_message_names_record() {
        let err = DecodeError::SizeMismatch {
            index: 7,
            expected: 784,
            actual: 100,
        };
        assert_eq!(
            err.to_string(),
            "Size mismatch at record 7: expected 784 bytes, got 100 bytes"
        );
    }
}
