//! `idxcodec convert`: batch copy, one concurrent job per input file.

use anyhow::{bail, Context, Result};
use idxcodec_batch::{
    BatchConfig, BatchScheduler, BatchSummary, LineWriterSink, NullSink, ProgressSink,
};
use idxcodec_core::IDX3_MAGIC;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

pub struct ConvertArgs {
    pub paths: Vec<PathBuf>,
    pub dirs: Vec<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub workers: Option<usize>,
    pub config: Option<PathBuf>,
    pub magic: bool,
    pub json: bool,
}

pub fn run(args: ConvertArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => BatchConfig::load(path)?,
        None => BatchConfig::default(),
    };
    if let Some(dir) = args.out_dir {
        config.output_dir = dir;
    }
    if let Some(n) = args.workers {
        config.max_workers = n;
    }
    if args.magic {
        config.expected_magic = Some(IDX3_MAGIC);
    }

    let inputs = collect_inputs(&args.paths, &args.dirs)?;
    if inputs.is_empty() {
        bail!("no input files: pass paths or --dir");
    }

    let progress: Arc<dyn ProgressSink> = if args.json {
        Arc::new(NullSink)
    } else {
        Arc::new(LineWriterSink::new(std::io::stdout()))
    };
    let scheduler = BatchScheduler::new(config).with_progress(progress);
    let outcomes = scheduler.run(&inputs)?;
    let summary = BatchSummary::from_outcomes(&outcomes);

    if args.json {
        let out = serde_json::json!({ "summary": summary, "outcomes": outcomes });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        for o in &outcomes {
            if o.succeeded {
                println!(
                    "  ✓ {} → {} ({} records)",
                    o.source_path.display(),
                    o.output_path.display(),
                    o.records_processed
                );
            } else {
                println!(
                    "  ✗ {}: [{}] {}",
                    o.source_path.display(),
                    o.error_kind.as_deref().unwrap_or("unknown"),
                    o.error_message.as_deref().unwrap_or("")
                );
            }
        }
        println!(
            "\n{} files: {} succeeded, {} failed, {} records copied",
            summary.total, summary.succeeded, summary.failed, summary.records_processed
        );
    }

    if !summary.all_succeeded() {
        bail!("{} of {} conversions failed", summary.failed, summary.total);
    }
    Ok(())
}

/// Explicit paths first, in the order given, then `*-ubyte` files found
/// under each directory, sorted.
fn collect_inputs(paths: &[PathBuf], dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = paths.to_vec();
    for dir in dirs {
        let mut found = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = entry.with_context(|| format!("scan '{}'", dir.display()))?;
            if entry.file_type().is_file() && is_dataset_file(entry.path()) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        inputs.extend(found);
    }
    Ok(inputs)
}

fn is_dataset_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with("-ubyte"))
        .unwrap_or(false)
}
