//! Mongodb source integration

use bson::{doc, Bson, DateTime, Document};
use mongodb::sync::Collection;
use time::OffsetDateTime;
use tracing::debug;

use super::{in_window, parse_time, FieldsConfiguration, HistorySource};
use crate::error::SourceError;
use crate::LocationPoint;

/// MongoDB history source
///
/// Connection lifecycle and timeouts belong to the `Client` the collection
/// comes from, eg.: `serverSelectionTimeoutMS` on the connection string.
pub struct MongoDbSource {
    collection: Collection<Document>,
    fields: FieldsConfiguration,
    since: Option<OffsetDateTime>,
}

impl MongoDbSource {
    pub fn new(collection: Collection<Document>, fields: Option<FieldsConfiguration>) -> Self {
        Self {
            collection,
            fields: fields.unwrap_or_default(),
            since: None,
        }
    }

    /// Ignore locations recorded before `since`
    pub fn since(mut self, since: OffsetDateTime) -> Self {
        self.since = Some(since);
        self
    }
}

impl HistorySource for MongoDbSource {
    fn fetch_history(&self, user_id: &str) -> Result<Vec<LocationPoint>, SourceError> {
        let mut points = vec![];

        let cursor = self
            .collection
            .find(history_filter(&self.fields, user_id, self.since), None)
            .map_err(|e| SourceError::Query(format!("Failed on fetch the docs: {}", e)))?;

        for rdoc in cursor {
            let doc = rdoc
                .map_err(|e| SourceError::Query(format!("Failed on read some doc: {}", e)))?;

            let (point, time) = parse_doc(&self.fields, &doc).map_err(|e| match doc.get("_id") {
                Some(id) => SourceError::Document(format!("Error with doc {0}: {1}", id, e)),
                None => SourceError::Document(e),
            })?;

            if in_window(time, self.since) {
                points.push(point);
            }
        }

        debug!(user_id, points = points.len(), "fetched mongo history");

        Ok(points)
    }
}

/// Match the user id stored either as string or as number
fn user_filter(fields: &FieldsConfiguration, user_id: &str) -> Document {
    match user_id.parse::<i64>() {
        Ok(n) => doc! { fields.user_id.clone(): { "$in": [user_id, n] } },
        Err(_) => doc! { fields.user_id.clone(): user_id },
    }
}

/// User filter plus the `since` window for BSON dates.
///
/// String and timestamp times can't be compared on the server, those
/// documents are still fetched and checked by `in_window`.
fn history_filter(
    fields: &FieldsConfiguration,
    user_id: &str,
    since: Option<OffsetDateTime>,
) -> Document {
    let mut filter = user_filter(fields, user_id);

    if let Some(since) = since {
        filter.insert(
            "$or",
            vec![
                doc! { fields.time.clone(): { "$gte": DateTime::from_time_0_3(since) } },
                doc! { fields.time.clone(): { "$not": { "$type": "date" } } },
            ],
        );
    }

    filter
}

fn parse_doc(
    fields: &FieldsConfiguration,
    doc: &Document,
) -> Result<(LocationPoint, Option<OffsetDateTime>), String> {
    let coordinates = doc
        .get_array(&fields.coordinates)
        .map_err(|e| format!("Failed on access the `{}`: {}", fields.coordinates, e))?;
    if coordinates.len() != 2 {
        return Err("Coordinates size invalid".to_string());
    }

    let (ilng, ilat) = if fields.flip_coordinates { (1, 0) } else { (0, 1) };

    let lat = number(&coordinates[ilat]).ok_or("Invalid type of latitude")?;
    let lng = number(&coordinates[ilng]).ok_or("Invalid type of longitude")?;

    let time = match doc.get(&fields.time) {
        Some(Bson::String(tm)) => Some(parse_time(tm).map_err(|e| e.to_string())?),
        Some(Bson::DateTime(tm)) => Some(tm.to_time_0_3()),
        Some(Bson::Timestamp(tm)) => Some(
            OffsetDateTime::from_unix_timestamp(tm.time.into())
                .map_err(|e| format!("Failed on parse the time timestamp: {}", e))?,
        ),
        Some(Bson::Null) | None => None,
        Some(_) => return Err("Time field type not supported".to_string()),
    };

    Ok((LocationPoint::new(lng, lat), time))
}

fn number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(v) => Some(*v),
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        _ => None,
    }
}
