//! Schedule to event mapping.
//!
//! Pure transformation of an in-scope schedule into its normalized
//! pathway-confirmed event. Waypoints are resolved against the station
//! directory strictly in input order; unresolved waypoints are dropped
//! rather than replaced with placeholders.

use crate::cif::{Schedule, Waypoint};
use crate::domain::{EventMetadata, NormalizedEvent, PassagePoint, format_schedule_time};
use crate::stations::StationDirectory;

/// Origin/destination value used when no waypoint resolves at all.
pub const UNKNOWN_STATION: &str = "UNKNOWN";

/// Map an accepted schedule to its normalized event.
///
/// The overall origin and destination are the display codes of the first
/// and last *resolved* passage points, not the first and last raw
/// waypoints. Never fails: malformed times pass through unformatted.
pub fn map_schedule(
    schedule: &Schedule,
    directory: &StationDirectory,
    run_id: &str,
) -> NormalizedEvent {
    let passage_points: Vec<PassagePoint> = schedule
        .waypoints
        .iter()
        .filter_map(|waypoint| resolve_waypoint(waypoint, directory))
        .collect();

    let origin = passage_points
        .first()
        .map(|point| point.station_code.clone())
        .unwrap_or_else(|| UNKNOWN_STATION.to_string());
    let destination = passage_points
        .last()
        .map(|point| point.station_code.clone())
        .unwrap_or_else(|| UNKNOWN_STATION.to_string());

    NormalizedEvent {
        train_service_number: schedule.train_id.clone(),
        travel_date: schedule.validity_start_date.clone(),
        origin,
        destination,
        passage_points,
        metadata: EventMetadata::for_run(run_id),
    }
}

/// Resolve one waypoint, preferring working times over public times.
fn resolve_waypoint(waypoint: &Waypoint, directory: &StationDirectory) -> Option<PassagePoint> {
    let station = directory.resolve(&waypoint.location_id)?;

    let arrival = waypoint
        .arrival_time
        .as_deref()
        .or(waypoint.public_arrival_time.as_deref())
        .map(format_schedule_time);
    let departure = waypoint
        .departure_time
        .as_deref()
        .or(waypoint.public_departure_time.as_deref())
        .map(format_schedule_time);

    Some(PassagePoint {
        station_code: station.code.clone(),
        station_name: station.name.clone(),
        arrival,
        departure,
        platform: waypoint.platform.clone(),
    })
}
