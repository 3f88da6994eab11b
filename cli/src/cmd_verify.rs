//! `idxcodec verify`: full read-through without writing anything.

use anyhow::{Context, Result};
use idxcodec_core::{DatasetReader, IDX3_MAGIC};
use std::path::Path;

pub fn run(path: &Path, require_magic: bool) -> Result<()> {
    let mut reader = DatasetReader::open_path(path)?;
    let header = reader
        .read_header()
        .with_context(|| format!("decode header of '{}'", path.display()))?;

    if require_magic {
        header.check_magic(IDX3_MAGIC)?;
    }

    let mut count = 0u64;
    for record in reader.records() {
        record.with_context(|| format!("verify '{}'", path.display()))?;
        count += 1;
    }

    println!(
        "✓ {}: {} records of {} x {} ({})",
        path.display(),
        count,
        header.row_count,
        header.column_count,
        header
    );
    Ok(())
}
