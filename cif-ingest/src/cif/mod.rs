//! CIF feed record types, decoding and scope classification.
//!
//! CIF (Common Interface Format) schedule feeds are newline-delimited JSON
//! records. Each line is one envelope: a timetable header (first line,
//! informational), a schedule, or some other record type this pipeline does
//! not consume.

mod classify;
mod types;

pub use classify::{FilterReason, classify};
pub use types::{
    DecodeError, EnvelopeRecord, Schedule, SequenceRole, StpIndicator, TimetableHeader, Waypoint,
};
