//! Stream ingestion pipeline.
//!
//! The orchestrator: detects compression, iterates lines, decodes
//! envelopes, routes schedules through classification, deduplication and
//! mapping, and publishes accepted events. This is the only component with
//! I/O and mutable run state; everything below it is pure or injected.

mod result;
mod run;

#[cfg(test)]
mod run_tests;

pub use result::{RunResult, RunStats, RunStatus};
pub use run::{Pipeline, RunOptions};
