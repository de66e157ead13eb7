//! Logging infrastructure for Appshelf
//!
//! Structured per-query events, optionally persisted as JSONL.

pub mod query_log;

pub use query_log::{QueryEvent, QueryLogger, QueryOutcome};
