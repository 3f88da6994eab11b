//! Error types for the batch layer.
//!
//! Per-file failures never show up here: they are reported inside each
//! [`JobOutcome`](crate::job::JobOutcome), including an output directory
//! that cannot be created. These errors only cover setting up a batch.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Two jobs would write the same output file: {path}")]
    OutputCollision { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
