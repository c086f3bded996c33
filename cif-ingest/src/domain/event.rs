//! Normalized pathway-confirmed event.
//!
//! The outward unit of the pipeline. Field names serialize in the camelCase
//! the downstream planning consumers expect.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata domain for short-term planning events.
pub const EVENT_DOMAIN: &str = "planning.short_term";

/// Event name emitted for every accepted schedule.
pub const EVENT_NAME: &str = "InfrastructurePathwayConfirmed";

/// One accepted schedule, resolved against the station directory and ready
/// for the publishing transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    /// Train identifier, copied from the schedule.
    pub train_service_number: String,
    /// Validity start date, copied from the schedule.
    pub travel_date: String,
    /// Display code of the first resolvable waypoint, or "UNKNOWN".
    pub origin: String,
    /// Display code of the last resolvable waypoint, or "UNKNOWN".
    pub destination: String,
    /// Resolved waypoints in journey order. Waypoints whose location is not
    /// in the station directory are absent, not placeholders.
    pub passage_points: Vec<PassagePoint>,
    pub metadata: EventMetadata,
}

/// One resolved stop or pass-through point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassagePoint {
    pub station_code: String,
    pub station_name: String,
    /// "HH:MM" arrival, if the schedule carried one.
    pub arrival: Option<String>,
    /// "HH:MM" departure, if the schedule carried one.
    pub departure: Option<String>,
    pub platform: Option<String>,
}

/// Run-scoped envelope attached to every event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub domain: &'static str,
    pub name: &'static str,
    /// The caller's run identifier, for tracing events back to a run.
    pub correlation_id: String,
    /// UTC instant at which the schedule was mapped.
    pub timestamp: DateTime<Utc>,
}

impl EventMetadata {
    /// Metadata for an event mapped now, within the given run.
    pub fn for_run(run_id: &str) -> Self {
        Self {
            domain: EVENT_DOMAIN,
            name: EVENT_NAME,
            correlation_id: run_id.to_string(),
            timestamp: Utc::now(),
        }
    }
}
