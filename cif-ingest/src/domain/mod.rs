//! Domain types for the ingestion pipeline.
//!
//! The normalized event shapes handed to the publishing transport, and the
//! schedule-time formatting they rely on.

mod event;
mod time;

pub use event::{EVENT_DOMAIN, EVENT_NAME, EventMetadata, NormalizedEvent, PassagePoint};
pub use time::format_schedule_time;
