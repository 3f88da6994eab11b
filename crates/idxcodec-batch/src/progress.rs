//! Progress message sinks shared by concurrently running jobs.
//!
//! A sink receives whole lines. Implementations must never interleave two
//! lines; which job's line comes first is unspecified.

use std::io::Write;
use std::sync::Mutex;
use tracing::info;

/// Receives one progress line at a time from any job thread.
pub trait ProgressSink: Send + Sync {
    fn line(&self, message: &str);
}

/// Blanket impl so closures can be used as sinks.
impl<F: Fn(&str) + Send + Sync> ProgressSink for F {
    fn line(&self, message: &str) {
        self(message)
    }
}

/// Forwards progress lines to `tracing` at INFO level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn line(&self, message: &str) {
        info!(target: "idxcodec::progress", "{}", message);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn line(&self, _message: &str) {}
}

/// Writes each line, newline-terminated, to a shared writer under a lock.
pub struct LineWriterSink<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send> LineWriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.inner.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ProgressSink for LineWriterSink<W> {
    fn line(&self, message: &str) {
        let mut guard = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Progress output is best-effort; a failing terminal must not fail a job.
        let _ = writeln!(guard, "{}", message);
        let _ = guard.flush();
    }
}
