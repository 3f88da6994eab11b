//! `BatchScheduler`: runs one job per input file on a Rayon pool.

use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::job::{ConversionJob, JobOutcome, JobToken};
use crate::progress::{ProgressSink, TracingSink};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Aggregate counts over a batch's outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub records_processed: u64,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[JobOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
        Self {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            records_processed: outcomes.iter().map(|o| o.records_processed).sum(),
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Batch scheduler.
///
/// Every job runs to completion regardless of its siblings; `run` returns
/// once all of them have, with outcomes in submission order.
pub struct BatchScheduler {
    config: BatchConfig,
    progress: Arc<dyn ProgressSink>,
}

impl BatchScheduler {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            progress: Arc::new(TracingSink),
        }
    }

    /// Replace the default tracing sink.
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Converts every path; job `i` gets token `i`.
    pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<JobOutcome>, BatchError> {
        let jobs = paths
            .iter()
            .enumerate()
            .map(|(i, p)| ConversionJob::from_config(p.as_ref(), JobToken(i as u64), &self.config))
            .collect();
        self.run_jobs(jobs)
    }

    /// Runs caller-built jobs. Output paths must be pairwise distinct.
    pub fn run_jobs(&self, jobs: Vec<ConversionJob>) -> Result<Vec<JobOutcome>, BatchError> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::with_capacity(jobs.len());
        for job in &jobs {
            if !seen.insert(job.output()) {
                return Err(BatchError::OutputCollision {
                    path: job.output().to_path_buf(),
                });
            }
        }

        let workers = self.config.worker_count(jobs.len());
        info!(
            "BatchScheduler: converting {} files on {} workers",
            jobs.len(),
            workers
        );
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("idxcodec-worker-{i}"))
            .build()?;

        let progress: &dyn ProgressSink = self.progress.as_ref();
        self.progress.line("Beginning batch file copies...");

        // `with_max_len(1)` makes every job its own Rayon task; `collect` on an
        // indexed iterator keeps submission order.
        let outcomes: Vec<JobOutcome> = pool.install(|| {
            jobs.par_iter()
                .with_max_len(1)
                .map(|job| job.run(progress))
                .collect()
        });

        for outcome in &outcomes {
            progress.line(&format!(
                "Job {} using file: {} completed with result: {}",
                outcome.token,
                outcome.source_path.display(),
                outcome.succeeded
            ));
        }

        let summary = BatchSummary::from_outcomes(&outcomes);
        info!(
            "BatchScheduler: complete, {} succeeded, {} failed, {} records",
            summary.succeeded, summary.failed, summary.records_processed
        );
        self.progress.line("Ended batch file copies.");

        Ok(outcomes)
    }
}
