//! Location history sources API

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::format_description::well_known;
use time::OffsetDateTime;

use crate::error::SourceError;
use crate::LocationPoint;

/// Event store holding the location history of users
pub trait HistorySource {
    /// Fetch every known location of the user, in any order
    fn fetch_history(&self, user_id: &str) -> Result<Vec<LocationPoint>, SourceError>;
}

impl<S> HistorySource for &S
where
    S: HistorySource + ?Sized,
{
    fn fetch_history(&self, user_id: &str) -> Result<Vec<LocationPoint>, SourceError> {
        (**self).fetch_history(user_id)
    }
}

/// Names of the fields/columns read from the sources
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldsConfiguration {
    pub user_id: String,
    pub coordinates: String,
    pub time: String,
    /// Coordinates stored as `lat, lng` instead of `lng, lat`
    pub flip_coordinates: bool,
}

impl Default for FieldsConfiguration {
    fn default() -> Self {
        Self {
            user_id: "user".to_string(),
            coordinates: "coordinates".to_string(),
            time: "time".to_string(),
            flip_coordinates: false,
        }
    }
}

impl FieldsConfiguration {
    pub fn user_id(mut self, name: &str) -> Self {
        self.user_id = name.to_string();
        self
    }

    pub fn coordinates(mut self, name: &str) -> Self {
        self.coordinates = name.to_string();
        self
    }

    pub fn time(mut self, name: &str) -> Self {
        self.time = name.to_string();
        self
    }

    pub fn flip_coordinates(mut self, flip: bool) -> Self {
        self.flip_coordinates = flip;
        self
    }
}

/// In memory history, keyed by user
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    history: BTreeMap<String, Vec<LocationPoint>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user_id: &str, point: LocationPoint) -> &mut Self {
        self.history
            .entry(user_id.to_string())
            .or_default()
            .push(point);

        self
    }

    pub fn with_history(mut self, user_id: &str, points: Vec<LocationPoint>) -> Self {
        self.history
            .entry(user_id.to_string())
            .or_default()
            .extend(points);

        self
    }
}

impl HistorySource for MemorySource {
    fn fetch_history(&self, user_id: &str) -> Result<Vec<LocationPoint>, SourceError> {
        Ok(self.history.get(user_id).cloned().unwrap_or_default())
    }
}

/// Parse a RFC3339 time
pub(crate) fn parse_time(raw: &str) -> Result<OffsetDateTime, SourceError> {
    OffsetDateTime::parse(raw, &well_known::Rfc3339)
        .map_err(|e| SourceError::Document(format!("Failed on parse the time: {}", e)))
}

/// Entries without a time are always inside the window
pub(crate) fn in_window(time: Option<OffsetDateTime>, since: Option<OffsetDateTime>) -> bool {
    match (time, since) {
        (Some(t), Some(s)) => t >= s,
        _ => true,
    }
}

#[cfg(feature = "mongo")]
mod mongo;

#[cfg(feature = "mongo")]
pub use mongo::MongoDbSource;

#[cfg(feature = "csv")]
mod csv_file;

#[cfg(feature = "csv")]
pub use csv_file::CsvSource;
