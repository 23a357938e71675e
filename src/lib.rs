//! Parallel min/mean/max aggregation over `name;value` measurement files.
//!
//! The input is cut into newline-aligned byte ranges, each streamed by its
//! own reader thread into a bounded queue of record batches. Worker threads
//! fold batches into private maps which are merged once everything is read,
//! then rendered as `{name=min/mean/max, ...}` sorted by name bytes.

pub mod aggregate;
pub mod config;
pub mod distributor;
pub mod error;
pub mod format;
pub mod number;
pub mod pipeline;
pub mod planner;
pub mod reader;
pub mod splitter;
pub mod worker;

pub use aggregate::{Aggregator, Stat};
pub use config::Config;
pub use error::{BrcError, Result};
pub use format::Summary;
pub use pipeline::{run, Pipeline, StopToken};
pub use planner::ByteRange;
