//! `ConversionJob`: one file-to-file copy, end to end.
//!
//! A job is the error boundary of a batch: whatever goes wrong inside it is
//! turned into a [`JobOutcome`] with `succeeded = false`. It never aborts
//! its siblings.
//!
//! A job that fails after creating its output file removes that file again,
//! so no truncated dataset with a complete-looking header is left behind.

use crate::config::BatchConfig;
use crate::progress::ProgressSink;
use idxcodec_core::{
    DatasetError, DatasetReader, DatasetWriter, HeaderRecord, OpenError, DEFAULT_BUFFER_CAPACITY,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info_span, warn};

/// Caller-supplied identifier that keeps concurrent jobs' outputs apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobToken(pub u64);

impl fmt::Display for JobToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `output_dir/<source stem>.<token>.<extension>`
pub fn output_path_for(source: &Path, token: JobToken, config: &BatchConfig) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    let name = if config.output_extension.is_empty() {
        format!("{stem}.{token}")
    } else {
        format!("{stem}.{token}.{}", config.output_extension)
    };
    config.output_dir.join(name)
}

/// What one job reports back to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub token: JobToken,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub succeeded: bool,
    /// Records fully copied, including those before a failure.
    pub records_processed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub elapsed_ms: u64,
}

/// A single conversion from `source` to `output`.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    source: PathBuf,
    output: PathBuf,
    token: JobToken,
    expected_magic: Option<u32>,
    buffer_capacity: usize,
}

impl ConversionJob {
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>, token: JobToken) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            token,
            expected_magic: None,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// Job whose output path is derived from `token` and the config.
    pub fn from_config(source: impl Into<PathBuf>, token: JobToken, config: &BatchConfig) -> Self {
        let source = source.into();
        let output = output_path_for(&source, token, config);
        Self {
            source,
            output,
            token,
            expected_magic: config.expected_magic,
            buffer_capacity: config.buffer_capacity.max(1),
        }
    }

    pub fn expected_magic(mut self, magic: Option<u32>) -> Self {
        self.expected_magic = magic;
        self
    }

    pub fn buffer_capacity(mut self, bytes: usize) -> Self {
        self.buffer_capacity = bytes.max(1);
        self
    }

    pub fn token(&self) -> JobToken {
        self.token
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Runs the conversion. Never panics out and never returns an error:
    /// every failure is folded into the outcome.
    pub fn run(&self, progress: &dyn ProgressSink) -> JobOutcome {
        let span = info_span!("job", token = %self.token, source = %self.source.display());
        let _enter = span.enter();
        let started = Instant::now();
        let mut processed = 0u64;

        let result = catch_unwind(AssertUnwindSafe(|| self.convert(progress, &mut processed)));

        let (error_kind, error_message) = match result {
            Ok(Ok(())) => (None, None),
            Ok(Err(e)) => {
                warn!("job {} failed after {} records: {}", self.token, processed, e);
                progress.line(&format!(
                    "[job {}] {}: failed: {}",
                    self.token,
                    self.source.display(),
                    e
                ));
                (Some(e.kind().to_string()), Some(e.to_string()))
            }
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                warn!("job {} panicked: {}", self.token, msg);
                progress.line(&format!(
                    "[job {}] {}: aborted: {}",
                    self.token,
                    self.source.display(),
                    msg
                ));
                (Some("panic".to_string()), Some(msg))
            }
        };

        JobOutcome {
            token: self.token,
            source_path: self.source.clone(),
            output_path: self.output.clone(),
            succeeded: error_kind.is_none(),
            records_processed: processed,
            error_kind,
            error_message,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Both streams are dropped (closed) on every return path.
    fn convert(&self, progress: &dyn ProgressSink, processed: &mut u64) -> Result<(), DatasetError> {
        let token = self.token;

        let mut reader: DatasetReader<BufReader<File>> = DatasetReader::new();
        reader.open_with_capacity(&self.source, self.buffer_capacity)?;
        let header = reader.read_header()?;
        progress.line(&format!("[job {token}] Logged a header: {header}"));

        if let Some(magic) = self.expected_magic {
            header.check_magic(magic)?;
        }

        if let Some(dir) = self.output.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| OpenError::FileNotOpen {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let mut writer: DatasetWriter<BufWriter<File>> = DatasetWriter::new();
        writer.open_with_capacity(&self.output, self.buffer_capacity)?;
        progress.line(&format!(
            "[job {token}] Copying {} records to {}...",
            header.record_count,
            self.output.display()
        ));

        if let Err(e) = copy_dataset(&mut reader, writer, &header, processed) {
            self.discard_output();
            return Err(e);
        }

        debug!("job {} copied {} records", token, processed);
        progress.line(&format!("[job {token}] Copied {processed} records."));
        Ok(())
    }

    /// Removes a partly written output. Only regular files are touched.
    fn discard_output(&self) {
        let is_file = std::fs::metadata(&self.output)
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return;
        }
        match std::fs::remove_file(&self.output) {
            Ok(()) => debug!("job {}: removed partial output {}", self.token, self.output.display()),
            Err(e) => warn!(
                "job {}: cannot remove partial output {}: {}",
                self.token,
                self.output.display(),
                e
            ),
        }
    }
}

/// Writes `header` and every record the reader yields, then flushes.
fn copy_dataset<R: Read, W: Write>(
    reader: &mut DatasetReader<R>,
    mut writer: DatasetWriter<W>,
    header: &HeaderRecord,
    processed: &mut u64,
) -> Result<W, DatasetError> {
    writer.write_header(header)?;
    for _ in 0..header.record_count {
        let record = reader.next_record()?;
        writer.write_record(&record)?;
        *processed += 1;
    }
    Ok(writer.finish()?)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}
