//! CSV file source integration

use std::collections::BTreeMap;
use std::io::Read;

use csv::{Reader, StringRecord};
use time::OffsetDateTime;
use tracing::debug;

use super::{in_window, parse_time, FieldsConfiguration, HistorySource};
use crate::error::SourceError;
use crate::LocationPoint;

/// CSV history source
///
/// The whole file is read and indexed by user on creation.
pub struct CsvSource {
    history: BTreeMap<String, Vec<(LocationPoint, Option<OffsetDateTime>)>>,
    since: Option<OffsetDateTime>,
}

impl CsvSource {
    pub fn new<T>(mut rdr: Reader<T>, fields: Option<FieldsConfiguration>) -> Result<Self, SourceError>
    where
        T: Read,
    {
        let fields = fields.unwrap_or_default();
        let mut history: BTreeMap<String, Vec<(LocationPoint, Option<OffsetDateTime>)>> =
            BTreeMap::new();

        let mut header = rdr
            .headers()
            .map_err(|e| SourceError::Io(format!("Failed on read the header: {}", e)))?
            .clone();
        let header_idx = parse_header(&fields, &mut header)?;

        let mut rows = 0;
        for row in rdr.records() {
            let mut rec = row.map_err(|e| SourceError::Io(format!("Failed on read some row: {}", e)))?;

            if rec.len() < 2 {
                continue;
            }

            let parsed = parse_row(&header_idx, &fields, &mut rec)
                .map_err(|e| SourceError::Document(format!("Error with row {:?}: {}", rec, e)))?;

            if let Some((user_id, point, time)) = parsed {
                history.entry(user_id).or_default().push((point, time));
                rows += 1;
            }
        }

        debug!(rows, users = history.len(), "loaded csv history");

        Ok(Self {
            history,
            since: None,
        })
    }

    /// Ignore locations recorded before `since`
    pub fn since(mut self, since: OffsetDateTime) -> Self {
        self.since = Some(since);
        self
    }
}

impl HistorySource for CsvSource {
    fn fetch_history(&self, user_id: &str) -> Result<Vec<LocationPoint>, SourceError> {
        let points = match self.history.get(user_id) {
            Some(rows) => rows
                .iter()
                .filter(|(_, time)| in_window(*time, self.since))
                .map(|(point, _)| *point)
                .collect(),
            None => vec![],
        };

        Ok(points)
    }
}

/// Field to index map
#[derive(Debug)]
struct FieldsIndex {
    user_id: usize,
    coordinates: usize,
    time: Option<usize>,
}

fn parse_header(
    fields: &FieldsConfiguration,
    header: &mut StringRecord,
) -> Result<FieldsIndex, SourceError> {
    header.trim();

    let find = |name: &str| header.iter().position(|h| h.eq_ignore_ascii_case(name));

    let user_id = find(&fields.user_id)
        .ok_or_else(|| SourceError::Document("User header not found".to_string()))?;

    let coordinates = find(&fields.coordinates)
        .ok_or_else(|| SourceError::Document("Coordinates header not found".to_string()))?;

    let time = find(&fields.time);

    Ok(FieldsIndex {
        user_id,
        coordinates,
        time,
    })
}

fn parse_row(
    header: &FieldsIndex,
    fields: &FieldsConfiguration,
    row: &mut StringRecord,
) -> Result<Option<(String, LocationPoint, Option<OffsetDateTime>)>, String> {
    row.trim();

    let user_id = match row.get(header.user_id) {
        Some(d) => Ok(d.to_string()),
        None => Err("User field not found"),
    }?;

    let raw_coordinates = match row.get(header.coordinates) {
        Some(d) => Ok(d.to_string()),
        None => Err("Coordinates field not found"),
    }?;
    let separator = match raw_coordinates.as_str() {
        s if s.contains(',') => ",",
        s if s.contains(';') => ";",
        _ => " ",
    };
    let scoordinates: Vec<&str> = raw_coordinates
        .split(separator)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if scoordinates.len() != 2 {
        return Ok(None);
    }

    let (ilng, ilat) = if fields.flip_coordinates { (1, 0) } else { (0, 1) };

    let lat = scoordinates[ilat]
        .parse::<f64>()
        .map_err(|e| format!("Invalid latitude format: {}", e))?;
    let lng = scoordinates[ilng]
        .parse::<f64>()
        .map_err(|e| format!("Invalid longitude format: {}", e))?;

    let time = match header.time.and_then(|i| row.get(i)) {
        Some(d) if !d.is_empty() => Some(parse_time(d).map_err(|e| e.to_string())?),
        _ => None,
    };

    Ok(Some((user_id, LocationPoint::new(lng, lat), time)))
}
