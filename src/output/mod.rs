//! Output module for harvested records
//!
//! This module handles:
//! - The sink interface finished records are handed to
//! - Bundled sinks (in-memory, JSON lines)
//! - Harvest statistics and their printed report

mod jsonl;
mod memory;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesSink;
pub use memory::MemorySink;
pub use stats::{print_statistics, write_statistics, HarvestStats};
pub use traits::{OutputError, OutputResult, Record, RecordSink};
