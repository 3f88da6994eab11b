//! # idxcodec-core
//!
//! Codec for the IDX3 dataset container: a 16-byte big-endian header
//! (magic, record count, rows, columns) followed by `record_count`
//! fixed-size byte matrices stored back to back.
//!
//! The codec is fully deterministic given its input bytes and never
//! interprets record contents. Viewers and numeric front-ends receive a
//! [`RecordBuffer`] plus its dimensions.
//!
//! ## Usage
//! ```no_run
//! use idxcodec_core::DatasetReader;
//!
//! let mut reader = DatasetReader::open_path("t10k-images.idx3-ubyte")?;
//! let header = reader.read_header()?;
//! for record in reader.records() {
//!     let record = record?;
//!     assert_eq!(record.record_size(), header.record_size().unwrap_or(0));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod endian;
pub mod error;
pub mod header;
mod io;
pub mod reader;
pub mod record;
pub mod writer;

pub use endian::{is_swap_needed, swap_bytes, SwapBytes};
pub use error::{DatasetError, DecodeError, OpenError, WriteError};
pub use header::{HeaderRecord, HEADER_LEN, IDX3_MAGIC};
pub use reader::{DatasetReader, ReaderState, Records, DEFAULT_BUFFER_CAPACITY};
pub use record::{ReadOutcome, RecordBuffer};
pub use writer::{DatasetWriter, WriterState};
