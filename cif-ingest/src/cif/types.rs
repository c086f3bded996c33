//! Decoded CIF record shapes.
//!
//! These types map directly to the feed's camelCase JSON. They use `Option`
//! liberally because the feed omits fields rather than sending nulls:
//! origin waypoints have no arrival, terminal waypoints no departure.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Error decoding one feed line.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The line is not valid JSON, or a known variant had the wrong shape
    #[error("invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The line parsed as JSON but is not an object
    #[error("record is not a JSON object")]
    NotAnObject,
}

/// One decoded feed line.
///
/// The envelope is tagged by its `recordType` field. Record types this
/// pipeline does not understand decode to [`EnvelopeRecord::Unknown`] and
/// are skipped silently; only malformed JSON is a decode error.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeRecord {
    /// Feed header: appears once, informational only.
    Header(TimetableHeader),
    /// One planned train service.
    Schedule(Box<Schedule>),
    /// A record type this pipeline does not consume.
    Unknown,
}

impl EnvelopeRecord {
    /// Decode a single feed line.
    pub fn decode(line: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(line)?;
        if !value.is_object() {
            return Err(DecodeError::NotAnObject);
        }

        let record_type = value
            .get("recordType")
            .and_then(Value::as_str)
            .map(str::to_owned);

        match record_type.as_deref() {
            Some("timetableHeader") => Ok(Self::Header(serde_json::from_value(value)?)),
            Some("schedule") => Ok(Self::Schedule(Box::new(serde_json::from_value(value)?))),
            _ => Ok(Self::Unknown),
        }
    }
}

/// Feed header: extract classification, timestamp and owning authority.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableHeader {
    /// Extract classification (e.g. "full", "update").
    pub classification: Option<String>,
    /// When the feed was extracted at the source.
    pub extracted_at: Option<String>,
    /// Authority that owns the timetable.
    pub owner: Option<String>,
}

/// One planned train service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Train identifier; unique together with `validity_start_date`.
    pub train_id: String,
    pub stp_indicator: StpIndicator,
    /// First calendar date the schedule is active.
    pub validity_start_date: String,
    /// Last calendar date the schedule is active.
    pub validity_end_date: Option<String>,
    /// 7-character weekday mask, Monday first ("1111100"). Carried through,
    /// never filtered on here.
    pub days_of_operation: Option<String>,
    pub category: Option<String>,
    pub operator_code: Option<String>,
    pub power_or_unit_type: Option<String>,
    /// Ordered stops and pass-through points. May be empty.
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

impl Schedule {
    /// Composite key suppressing re-publication within a process lifetime.
    pub fn dedup_key(&self) -> String {
        format!("{}_{}", self.train_id, self.validity_start_date)
    }

    /// Position-derived role of the waypoint at `index`.
    ///
    /// A single-waypoint schedule counts its only waypoint as the origin.
    pub fn sequence_role(&self, index: usize) -> Option<SequenceRole> {
        if index >= self.waypoints.len() {
            return None;
        }
        Some(if index == 0 {
            SequenceRole::Origin
        } else if index == self.waypoints.len() - 1 {
            SequenceRole::Terminal
        } else {
            SequenceRole::Intermediate
        })
    }
}

/// Role of one waypoint within its schedule, derived from position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceRole {
    Origin,
    Intermediate,
    Terminal,
}

/// One stop or pass-through point of a schedule.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    /// Raw location code (TIPLOC); an opaque key into the station directory.
    pub location_id: String,
    /// Working arrival time, compact "HHMM[H]". Absent at the origin.
    pub arrival_time: Option<String>,
    /// Working departure time. Absent at the terminus.
    pub departure_time: Option<String>,
    /// Public (advertised) arrival time.
    pub public_arrival_time: Option<String>,
    /// Public (advertised) departure time.
    pub public_departure_time: Option<String>,
    pub platform: Option<String>,
}

/// STP (short-term planning) indicator.
///
/// Single-letter code distinguishing schedule variants. Only [`New`] is in
/// scope for this pipeline; the rest are overlay, cancellation and
/// permanent markers.
///
/// [`New`]: StpIndicator::New
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StpIndicator {
    /// "N": a new short-term planning schedule.
    New,
    /// "O": overlay on a permanent schedule.
    Overlay,
    /// "C": cancellation of a permanent schedule.
    Cancellation,
    /// "P": permanent schedule.
    Permanent,
    /// Any other code observed in the feed.
    Unrecognised(char),
}

impl StpIndicator {
    /// Interpret a single-letter code, case-insensitively.
    pub fn from_code(code: char) -> Self {
        match code.to_ascii_uppercase() {
            'N' => Self::New,
            'O' => Self::Overlay,
            'C' => Self::Cancellation,
            'P' => Self::Permanent,
            other => Self::Unrecognised(other),
        }
    }

    /// Whether this is the new/planning variant the pipeline consumes.
    pub fn is_planning(self) -> bool {
        matches!(self, Self::New)
    }
}

impl<'de> Deserialize<'de> for StpIndicator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(code), None) => Ok(Self::from_code(code)),
            _ => Err(de::Error::invalid_value(
                de::Unexpected::Str(&raw),
                &"a single-character STP indicator",
            )),
        }
    }
}
