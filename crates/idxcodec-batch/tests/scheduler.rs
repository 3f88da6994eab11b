//! End-to-end batch tests against real files in a scratch directory.

use idxcodec_batch::{
    BatchConfig, BatchScheduler, BatchSummary, ConversionJob, JobToken, LineWriterSink, NullSink,
    ProgressSink,
};
use idxcodec_core::HeaderRecord;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// The fixtures live two levels above the crate root.
fn fixture_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("../../fixtures/idx3");
    p.push(name);
    p
}

fn write_dataset(dir: &Path, name: &str, records: u32, rows: u32, cols: u32) -> PathBuf {
    let path = dir.join(name);
    let mut bytes = HeaderRecord::idx3(records, rows, cols).to_bytes().to_vec();
    let body_len = (records * rows * cols) as usize;
    bytes.extend((0..body_len).map(|i| (i % 251) as u8));
    std::fs::write(&path, bytes).unwrap();
    path
}

fn quiet(config: BatchConfig) -> BatchScheduler {
    BatchScheduler::new(config).with_progress(Arc::new(NullSink))
}

// ─── Isolation and ordering ───────────────────────────────────────────────────

#[test]
fn one_good_one_missing_in_submission_order() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let missing = dir.path().join("missing.idx3-ubyte");
    let good = fixture_path("two-by-two.idx3-ubyte");

    let sched = quiet(BatchConfig::default().output_dir(&out));

    let outcomes = sched.run(&[good.clone(), missing.clone()]).unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].succeeded);
    assert_eq!(outcomes[0].source_path, good);
    assert_eq!(outcomes[0].records_processed, 2);
    assert!(!outcomes[1].succeeded);
    assert_eq!(outcomes[1].source_path, missing);
    assert_eq!(outcomes[1].error_kind.as_deref(), Some("file_not_open"));

    // Reversed submission, reversed outcomes.
    let outcomes = sched.run(&[missing.clone(), good.clone()]).unwrap();
    assert!(!outcomes[0].succeeded);
    assert!(outcomes[1].succeeded);
}

#[test]
fn corrupt_file_does_not_affect_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_dataset(dir.path(), "a.idx3-ubyte", 50, 4, 4);
    let b = fixture_path("truncated.idx3-ubyte");
    let c = write_dataset(dir.path(), "c.idx3-ubyte", 20, 8, 8);
    let d = fixture_path("short-header.idx3-ubyte");

    let outcomes = quiet(BatchConfig::default().output_dir(dir.path().join("out")))
        .run(&[a, b, c, d])
        .unwrap();

    let kinds: Vec<Option<&str>> = outcomes.iter().map(|o| o.error_kind.as_deref()).collect();
    assert_eq!(kinds, vec![None, Some("size_mismatch"), None, Some("short_read")]);
    assert_eq!(outcomes[1].records_processed, 1);
    assert!(outcomes[0].output_path.exists());
    assert!(!outcomes[1].output_path.exists());

    let summary = BatchSummary::from_outcomes(&outcomes);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.records_processed, 50 + 1 + 20);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn huge_declared_dimensions_fail_alone() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_dataset(dir.path(), "good.idx3-ubyte", 1, 1, 1);
    let huge = dir.path().join("huge.idx3-ubyte");
    let mut bytes = HeaderRecord::idx3(1, 1 << 20, 1 << 20).to_bytes().to_vec();
    bytes.extend_from_slice(&[1, 2, 3]);
    std::fs::write(&huge, bytes).unwrap();

    let outcomes = quiet(BatchConfig::default().output_dir(dir.path().join("out")))
        .run(&[good, huge])
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].succeeded);
    assert_eq!(outcomes[1].error_kind.as_deref(), Some("size_mismatch"));
    assert_eq!(outcomes[1].records_processed, 0);
}

#[test]
fn unusable_output_dir_fails_every_job_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_dataset(dir.path(), "a.idx3-ubyte", 2, 2, 2);
    let b = write_dataset(dir.path(), "b.idx3-ubyte", 2, 2, 2);
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let outcomes = quiet(BatchConfig::default().output_dir(blocker.join("out")))
        .run(&[a.clone(), b.clone()])
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].source_path, a);
    assert_eq!(outcomes[1].source_path, b);
    for o in &outcomes {
        assert!(!o.succeeded);
        assert_eq!(o.error_kind.as_deref(), Some("file_not_open"));
    }
}

#[test]
fn tokens_follow_submission_index() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = (0..6)
        .map(|i| write_dataset(dir.path(), &format!("f{i}.idx3-ubyte"), 3, 2, 2))
        .collect();

    let outcomes = quiet(BatchConfig::default().output_dir(dir.path().join("out")).max_workers(2))
        .run(&paths)
        .unwrap();

    for (i, o) in outcomes.iter().enumerate() {
        assert_eq!(o.token, JobToken(i as u64));
        assert_eq!(o.source_path, paths[i]);
        assert!(o.succeeded);
        assert!(o
            .output_path
            .to_string_lossy()
            .ends_with(&format!("f{i}.{i}.idx3-ubyte")));
    }
}

// ─── Output correctness ───────────────────────────────────────────────────────

#[test]
fn same_input_twice_gives_identical_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_dataset(dir.path(), "same.idx3-ubyte", 40, 28, 28);

    let outcomes = quiet(BatchConfig::default().output_dir(dir.path().join("out")))
        .run(&[src.clone(), src.clone()])
        .unwrap();

    assert!(outcomes.iter().all(|o| o.succeeded));
    assert_ne!(outcomes[0].output_path, outcomes[1].output_path);

    let first = std::fs::read(&outcomes[0].output_path).unwrap();
    let second = std::fs::read(&outcomes[1].output_path).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, std::fs::read(&src).unwrap());
}

#[test]
fn explicit_jobs_use_their_own_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let src = fixture_path("two-by-two.idx3-ubyte");
    let cfg = BatchConfig::default().output_dir(dir.path());

    let jobs = vec![
        ConversionJob::from_config(&src, JobToken(100), &cfg),
        ConversionJob::from_config(&src, JobToken(7), &cfg),
    ];
    let outcomes = quiet(cfg).run_jobs(jobs).unwrap();
    assert_eq!(outcomes[0].token, JobToken(100));
    assert_eq!(outcomes[1].token, JobToken(7));
    assert!(outcomes[0].output_path.ends_with("two-by-two.100.idx3-ubyte"));
}

// ─── Progress ─────────────────────────────────────────────────────────────────

#[test]
fn progress_sink_sees_every_job() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = (0..4)
        .map(|i| write_dataset(dir.path(), &format!("p{i}.idx3-ubyte"), 5, 3, 3))
        .collect();

    let sink = Arc::new(LineWriterSink::new(Vec::<u8>::new()));
    let shared: Arc<dyn ProgressSink> = sink.clone();
    BatchScheduler::new(BatchConfig::default().output_dir(dir.path().join("out")))
        .with_progress(shared)
        .run(&paths)
        .unwrap();

    let sink = Arc::try_unwrap(sink).ok().expect("scheduler released the sink");
    let text = String::from_utf8(sink.into_inner()).unwrap();
    for i in 0..4 {
        assert!(
            text.lines().any(|l| l == format!("[job {i}] Copied 5 records.")),
            "missing completion line for job {i}:\n{text}"
        );
    }
    assert!(text.starts_with("Beginning batch file copies..."));
    assert!(text.trim_end().ends_with("Ended batch file copies."));
}
