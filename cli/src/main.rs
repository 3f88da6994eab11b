//! IdxCodec CLI: inspect, verify, and batch-convert IDX3 dataset files.
//!
//! # Commands
//! ```text
//! idxcodec inspect  <path> [--records N] [--json]
//! idxcodec verify   <path> [--magic]
//! idxcodec convert  [paths...] [--dir D]... [--out-dir O] [--workers N] [--config F] [--magic] [--json]
//! idxcodec info
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use idxcodec_observability::{init_tracing, LogConfig};
use std::path::PathBuf;

mod cmd_convert;
mod cmd_inspect;
mod cmd_verify;

#[derive(Parser)]
#[command(
    name = "idxcodec",
    about = "IdxCodec CLI: IDX3 dataset codec",
    long_about = "
IdxCodec CLI: decode, verify and copy IDX3 fixed-record dataset files
(e.g. t10k-images.idx3-ubyte, train-images.idx3-ubyte).

Logs go to stderr (RUST_LOG-style levels via --verbose); command output and
progress lines go to stdout.
",
    version
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a dataset's header and hex-dump its first records
    Inspect {
        /// Path to the .idx3-ubyte file
        path: PathBuf,
        /// Number of records to dump
        #[arg(long, default_value_t = 1)]
        records: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read every record and check the file's integrity
    Verify {
        /// Path to the .idx3-ubyte file
        path: PathBuf,
        /// Also require the IDX3 magic number (0x00000803)
        #[arg(long)]
        magic: bool,
    },

    /// Copy datasets concurrently, one job per file
    Convert {
        /// Input files
        paths: Vec<PathBuf>,
        /// Directories to scan for *-ubyte files
        #[arg(long)]
        dir: Vec<PathBuf>,
        /// Output directory (overrides the config file)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
        /// Worker threads, 0 = one per file (overrides the config file)
        #[arg(long)]
        workers: Option<usize>,
        /// YAML batch config
        #[arg(long)]
        config: Option<PathBuf>,
        /// Reject inputs without the IDX3 magic number
        #[arg(long)]
        magic: bool,
        /// Print outcomes as JSON instead of progress lines
        #[arg(long)]
        json: bool,
    },

    /// Show IdxCodec build and format info
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&LogConfig {
        level: (if cli.verbose { "debug" } else { "warn" }).to_string(),
        json: cli.log_json,
        ..LogConfig::default()
    });

    match cli.command {
        Commands::Inspect { path, records, json } => cmd_inspect::run(&path, records, json),

        Commands::Verify { path, magic } => cmd_verify::run(&path, magic),

        Commands::Convert {
            paths,
            dir,
            out_dir,
            workers,
            config,
            magic,
            json,
        } => cmd_convert::run(cmd_convert::ConvertArgs {
            paths,
            dirs: dir,
            out_dir,
            workers,
            config,
            magic,
            json,
        }),

        Commands::Info => cmd_info(),
    }
}

fn cmd_info() -> Result<()> {
    println!("IdxCodec v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Format:");
    println!("  header       16 bytes: magic, records, rows, columns (big-endian u32)");
    println!("  records      rows x columns bytes each, row-major");
    println!("  IDX3 magic   {:#010x}", idxcodec_core::IDX3_MAGIC);
    println!();
    println!("Host:");
    println!(
        "  byte order   {}",
        if idxcodec_core::is_swap_needed() {
            "little-endian (fields are swapped on read/write)"
        } else {
            "big-endian (no swap needed)"
        }
    );
    println!("  CPUs         {}", std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));
    Ok(())
}
