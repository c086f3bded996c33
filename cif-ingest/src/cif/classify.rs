//! Schedule scope classification.
//!
//! Decides whether a decoded schedule is in scope for event mapping, and if
//! not, why. Checks are ordered and the first failing check wins, so every
//! filtered schedule is counted under exactly one reason.

use std::fmt;

use crate::stations::StationDirectory;

use super::types::Schedule;

/// Why a schedule was filtered out of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    /// The STP indicator is not the new/planning value.
    NotPlanning,
    /// The schedule carries no waypoints at all.
    NoWaypoints,
    /// No waypoint location resolves in the station directory.
    NoKnownLocations,
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            FilterReason::NotPlanning => "not a planning schedule",
            FilterReason::NoWaypoints => "no location data",
            FilterReason::NoKnownLocations => "no recognized locations",
        };
        f.write_str(reason)
    }
}

/// Classify a schedule against the station directory.
///
/// Returns `Ok(())` for in-scope schedules; in-scope means a new planning
/// schedule with at least one waypoint the directory recognizes.
pub fn classify(schedule: &Schedule, directory: &StationDirectory) -> Result<(), FilterReason> {
    if !schedule.stp_indicator.is_planning() {
        return Err(FilterReason::NotPlanning);
    }
    if schedule.waypoints.is_empty() {
        return Err(FilterReason::NoWaypoints);
    }
    if !schedule
        .waypoints
        .iter()
        .any(|waypoint| directory.contains(&waypoint.location_id))
    {
        return Err(FilterReason::NoKnownLocations);
    }
    Ok(())
}
