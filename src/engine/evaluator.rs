//! Geofence evaluator API

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::distance::{to_angular_radius, DEFAULT_REFERENCE_LATITUDE};
use super::geofence::Geofence;
use super::point::LocationPoint;
use crate::error::GeofenceError;
use crate::sources::HistorySource;

/// Evaluation parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeofenceOptions {
    /// Clustering radius in meters
    pub radius_meters: f64,
    /// Density threshold, a core point included
    pub min_samples: usize,
    /// Latitude used for the meters to degrees conversion
    pub reference_latitude: f64,
}

impl Default for GeofenceOptions {
    fn default() -> Self {
        Self {
            radius_meters: 260.0,
            min_samples: 3,
            reference_latitude: DEFAULT_REFERENCE_LATITUDE,
        }
    }
}

impl GeofenceOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Tells whether a location is novel for a user.
///
/// Each call fetches the whole history and rebuilds the regions, nothing is
/// kept between calls. The evaluator is `Sync` whenever its source is.
pub struct GeofenceEvaluator<S> {
    source: S,
    options: GeofenceOptions,
}

impl<S> GeofenceEvaluator<S>
where
    S: HistorySource,
{
    pub fn new(source: S) -> Self {
        Self::with_options(source, GeofenceOptions::default())
    }

    pub fn with_options(source: S, options: GeofenceOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &GeofenceOptions {
        &self.options
    }

    /// Regions built from the user history
    pub fn geofence(
        &self,
        user_id: &str,
        radius_meters: Option<f64>,
    ) -> Result<Geofence, GeofenceError> {
        let radius = radius_meters.unwrap_or(self.options.radius_meters);
        if !radius.is_finite() || radius < 0.0 {
            return Err(GeofenceError::InvalidRadius(radius));
        }

        let history = self
            .source
            .fetch_history(user_id)
            .map_err(|source| GeofenceError::Upstream {
                user_id: user_id.to_string(),
                source,
            })?;

        let fetched = history.len();
        let points: Vec<LocationPoint> = history.into_iter().filter(|p| p.is_finite()).collect();
        if points.len() < fetched {
            warn!(
                user_id,
                skipped = fetched - points.len(),
                "Skipping non finite history points"
            );
        }

        if points.len() < self.options.min_samples {
            debug!(user_id, points = points.len(), "not enough history");
            return Ok(Geofence::default());
        }

        let eps = to_angular_radius(radius, self.options.reference_latitude);

        Ok(Geofence::from_points(points, eps, self.options.min_samples))
    }

    /// `true` when the location is outside every known region of the user
    pub fn evaluate(
        &self,
        user_id: &str,
        longitude: f64,
        latitude: f64,
        radius_meters: Option<f64>,
    ) -> Result<bool, GeofenceError> {
        let point = LocationPoint::new(longitude, latitude);
        if !point.is_finite() {
            return Err(GeofenceError::InvalidCoordinates {
                longitude,
                latitude,
            });
        }

        let geofence = self.geofence(user_id, radius_meters)?;
        let alert = !geofence.contains(&point);

        info!(
            user_id,
            longitude,
            latitude,
            regions = geofence.regions.len(),
            alert,
            "evaluated location"
        );

        Ok(alert)
    }
}
