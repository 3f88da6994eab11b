//! # idxcodec-batch
//!
//! Concurrent batch conversion of IDX3 datasets.
//!
//! ## Features
//! - One Rayon task per input file (or a bounded pool via `max_workers`)
//! - Deterministic, token-based output naming so jobs never share a file
//! - Per-job outcomes, returned in submission order; one bad file never
//!   stops the rest
//! - Line-atomic progress sinks safe to share across job threads
//!
//! ## Usage
//! ```no_run
//! use idxcodec_batch::{BatchConfig, BatchScheduler};
//!
//! let scheduler = BatchScheduler::new(BatchConfig::default().output_dir("out"));
//! let outcomes = scheduler.run(&["t10k-images.idx3-ubyte", "train-images.idx3-ubyte"])?;
//! for o in &outcomes {
//!     println!("{} -> {}", o.source_path.display(), o.succeeded);
//! }
//! # Ok::<(), idxcodec_batch::BatchError>(())
//! ```

pub mod config;
pub mod error;
pub mod job;
pub mod progress;
pub mod scheduler;

pub use config::BatchConfig;
pub use error::{BatchError, ConfigError};
pub use job::{output_path_for, ConversionJob, JobOutcome, JobToken};
pub use progress::{LineWriterSink, NullSink, ProgressSink, TracingSink};
pub use scheduler::{BatchScheduler, BatchSummary};
