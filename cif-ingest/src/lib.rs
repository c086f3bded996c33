//! CIF schedule ingestion pipeline.
//!
//! Consumes newline-delimited CIF schedule feeds (optionally
//! gzip-compressed), filters them down to new planning schedules,
//! suppresses records already accepted during this process lifetime, and
//! emits one normalized "pathway confirmed" event per accepted schedule.

pub mod cif;
pub mod dedup;
pub mod domain;
pub mod mapper;
pub mod pipeline;
pub mod publish;
pub mod stations;
