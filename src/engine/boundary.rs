//! Region boundaries: one convex hull per cluster

use std::collections::BTreeMap;

use geo::algorithm::{Area, ConvexHull};
use geo::geometry::{Coord, LineString, MultiPoint, Point, Polygon};
use serde::{Deserialize, Serialize};

use super::geofence::Geofence;
use super::point::{ClusterLabel, LabeledPoints, LocationPoint};
use crate::error::{DegenerateGeometry, DegenerateReason};

/// Convex boundary of one cluster.
///
/// Vertices are the hull corners in counter-clockwise order, without the
/// closing vertex. Points lying on a hull edge are never vertices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub label: usize,
    pub vertices: Vec<LocationPoint>,
}

impl Region {
    pub fn polygon(&self) -> Polygon {
        let ring: Vec<Coord> = self.vertices.iter().map(|v| Coord::from(*v)).collect();

        Polygon::new(LineString::from(ring), vec![])
    }
}

/// Convex hull of the cluster `label` members
pub fn build_hull(label: usize, members: &[LocationPoint]) -> Result<Region, DegenerateGeometry> {
    if members.len() < 3 {
        return Err(DegenerateGeometry {
            label,
            reason: DegenerateReason::TooFewPoints(members.len()),
        });
    }

    if members.iter().any(|m| !m.is_finite()) {
        return Err(DegenerateGeometry {
            label,
            reason: DegenerateReason::NonFinite,
        });
    }

    let cloud: MultiPoint = members.iter().map(|m| Point::from(*m)).collect();
    let hull = cloud.convex_hull();

    let mut vertices: Vec<LocationPoint> = hull
        .exterior()
        .coords()
        .map(|c| LocationPoint::from(*c))
        .collect();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    if vertices.len() < 3 || hull.unsigned_area() <= 0.0 {
        return Err(DegenerateGeometry {
            label,
            reason: DegenerateReason::Collinear,
        });
    }

    Ok(Region { label, vertices })
}

/// Hull attempt for each distinct cluster, in label order
pub fn build_hulls(labeled: &LabeledPoints) -> Vec<Result<Region, DegenerateGeometry>> {
    let mut groups: BTreeMap<usize, Vec<LocationPoint>> = BTreeMap::new();

    for (point, label) in labeled.iter() {
        if let ClusterLabel::Cluster(id) = label {
            groups.entry(*id).or_default().push(*point);
        }
    }

    groups
        .iter()
        .map(|(label, members)| build_hull(*label, members))
        .collect()
}

/// Regions of every cluster with a usable hull, degenerate clusters dropped
pub fn build_regions(labeled: &LabeledPoints) -> Vec<Region> {
    Geofence::from_labeled(labeled).regions
}
