//! `idxcodec inspect`: header plus a hex dump of the first records.

use anyhow::{Context, Result};
use idxcodec_core::{DatasetReader, RecordBuffer};
use std::path::Path;

pub fn run(path: &Path, limit: u32, as_json: bool) -> Result<()> {
    let mut reader = DatasetReader::open_path(path)?;
    let header = reader
        .read_header()
        .with_context(|| format!("decode header of '{}'", path.display()))?;

    let mut records = Vec::new();
    for (index, record) in reader.records().take(limit as usize).enumerate() {
        records.push(record.with_context(|| format!("read record {}", index))?);
    }

    if as_json {
        let dumped: Vec<Vec<String>> = records.iter().map(hex_rows).collect();
        let out = serde_json::json!({
            "path": path.display().to_string(),
            "header": header,
            "record_size": header.record_size(),
            "expected_file_size": header.dataset_len(),
            "records": dumped,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("File:    {}", path.display());
    println!("Header:  {}", header);
    match header.dataset_len() {
        Some(len) => println!("Size:    {} bytes expected", len),
        None => println!("Size:    overflows u64"),
    }
    for (index, record) in records.iter().enumerate() {
        println!("\nRecord {} ({} x {}):", index, record.rows(), record.columns());
        for row in hex_rows(record) {
            println!("  {}", row);
        }
    }
    Ok(())
}

fn hex_rows(record: &RecordBuffer) -> Vec<String> {
    (0..record.rows())
        .filter_map(|r| record.row(r))
        .map(hex::encode)
        .collect()
}
