//! # idxcodec-observability
//!
//! Logging setup for IdxCodec binaries.
//!
//! Library crates only emit `tracing` events; installing a subscriber is
//! left to the binary, which calls [`init_tracing`] once at startup.
//! Output is either human-readable or JSON (ELK, Loki, CloudWatch), with
//! per-component level overrides.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, LogConfig};
