//! Region set of one user

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::boundary::{build_hulls, Region};
use super::clusterer::cluster;
use super::membership::is_inside;
use super::point::{LabeledPoints, LocationPoint};

/// The usual areas of a user at one evaluation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub regions: Vec<Region>,
    /// Clusters without a usable boundary
    pub dropped: usize,
}

impl Geofence {
    /// Cluster the points and bound each cluster
    pub fn from_points(points: Vec<LocationPoint>, eps: f64, min_samples: usize) -> Self {
        Self::from_labeled(&cluster(points, eps, min_samples))
    }

    pub fn from_labeled(labeled: &LabeledPoints) -> Self {
        let mut geofence = Geofence::default();

        for hull in build_hulls(labeled) {
            match hull {
                Ok(region) => geofence.regions.push(region),
                Err(e) => {
                    warn!("Dropping region: {}", e);
                    geofence.dropped += 1;
                }
            }
        }

        debug!(
            regions = geofence.regions.len(),
            dropped = geofence.dropped,
            "built geofence"
        );

        geofence
    }

    pub fn contains(&self, point: &LocationPoint) -> bool {
        is_inside(point, &self.regions)
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
