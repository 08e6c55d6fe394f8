//! Per-key min/mean/max aggregation over `key;value` lines.

pub mod aggregate;
pub mod byte_buffer;
pub mod emit;
pub mod error;
pub mod generate;
pub mod process;
pub mod record;
pub mod stats;
pub mod table;

pub use aggregate::{Aggregator, aggregate};
pub use emit::emit;
pub use error::{Error, Result};
pub use process::{Summary, process_file};
pub use stats::Stats;
pub use table::Table;
