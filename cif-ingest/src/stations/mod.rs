//! Station reference data.
//!
//! Maps raw CIF location codes (TIPLOCs) to known stations. The directory
//! is immutable for the process lifetime and injected into the pipeline, so
//! tests can substitute a minimal mapping.

mod directory;

pub use directory::{DirectoryError, Station, StationDirectory};
