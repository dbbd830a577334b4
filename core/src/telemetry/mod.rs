//! telemetry/mod.rs
//! Per-decorator counters, serializable for reporting.

pub mod counters;

pub use counters::*;
