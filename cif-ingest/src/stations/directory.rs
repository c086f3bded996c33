//! Location-id to station lookup.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use serde::Deserialize;

/// Error loading a station directory from disk.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Reading the station file failed
    #[error("failed to read station file: {0}")]
    Io(#[from] io::Error),

    /// The station file is not valid JSON of the expected shape
    #[error("failed to parse station file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Metadata for one known station.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// Short display code used in emitted events.
    pub code: String,
    /// Human-readable station name.
    pub name: String,
    /// Whether this is a border or international connection point.
    #[serde(default, rename = "isBorderOrInternationalConnection")]
    pub border_connection: bool,
}

/// Immutable location-id → station lookup.
///
/// Not every location id observed in real feeds is present here. Absence is
/// expected and handled by callers; it is never an error.
#[derive(Debug, Clone, Default)]
pub struct StationDirectory {
    stations: HashMap<String, Station>,
}

impl StationDirectory {
    /// Build a directory from (location id, station) pairs.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Station)>,
    {
        Self {
            stations: entries.into_iter().collect(),
        }
    }

    /// Load a directory from a JSON object mapping location ids to stations.
    ///
    /// ```json
    /// {
    ///   "ASDM": { "code": "ASD", "name": "Amsterdam Centraal" },
    ///   "EMNZ": { "code": "EMN", "name": "Emmerich Grenze",
    ///             "isBorderOrInternationalConnection": true }
    /// }
    /// ```
    pub fn from_json_reader(reader: impl io::Read) -> Result<Self, DirectoryError> {
        let stations: HashMap<String, Station> = serde_json::from_reader(reader)?;
        Ok(Self { stations })
    }

    /// Load a directory from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let file = std::fs::File::open(path)?;
        Self::from_json_reader(io::BufReader::new(file))
    }

    /// Look up a station by raw location id.
    pub fn resolve(&self, location_id: &str) -> Option<&Station> {
        self.stations.get(location_id)
    }

    /// Whether the location id maps to a known station.
    pub fn contains(&self, location_id: &str) -> bool {
        self.stations.contains_key(location_id)
    }

    /// Number of known stations.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Whether the directory has no stations at all.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
