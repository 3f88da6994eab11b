//! Batch configuration.

use crate::error::ConfigError;
use idxcodec_core::DEFAULT_BUFFER_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level batch configuration. Every field has a default, so an empty
/// YAML document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory that receives converted files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Extension of derived output file names (empty = none)
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
    /// Worker threads (0 = one per input file)
    #[serde(default)]
    pub max_workers: usize,
    /// Reject inputs whose header magic differs from this value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_magic: Option<u32>,
    /// BufReader/BufWriter capacity per stream, in bytes
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

fn default_output_dir() -> PathBuf { PathBuf::from(".") }
fn default_output_extension() -> String { "idx3-ubyte".into() }
fn default_buffer_capacity() -> usize { DEFAULT_BUFFER_CAPACITY }

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            output_extension: default_output_extension(),
            max_workers: 0,
            expected_magic: None,
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

impl BatchConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.max_workers = n;
        self
    }

    pub fn expected_magic(mut self, magic: Option<u32>) -> Self {
        self.expected_magic = magic;
        self
    }

    /// Threads to use for `job_count` jobs.
    pub fn worker_count(&self, job_count: usize) -> usize {
        match self.max_workers {
            0 => job_count.max(1),
            n => n.min(job_count).max(1),
        }
    }
}
