//! Location point and cluster label definitions

use std::cmp::Ordering;
use std::fmt;

use geo::geometry::{Coord, Point};
use serde::{Deserialize, Serialize};

/// A recorded location, in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl LocationPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Both coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }

    /// Total order by longitude then latitude
    pub(crate) fn canonical_cmp(&self, other: &LocationPoint) -> Ordering {
        self.longitude
            .total_cmp(&other.longitude)
            .then(self.latitude.total_cmp(&other.latitude))
    }
}

impl From<Point> for LocationPoint {
    fn from(p: Point) -> Self {
        Self::new(p.x(), p.y())
    }
}

impl From<Coord> for LocationPoint {
    fn from(c: Coord) -> Self {
        Self::new(c.x, c.y)
    }
}

impl From<LocationPoint> for Point {
    fn from(p: LocationPoint) -> Self {
        Point::new(p.longitude, p.latitude)
    }
}

impl From<LocationPoint> for Coord {
    fn from(p: LocationPoint) -> Self {
        Coord {
            x: p.longitude,
            y: p.latitude,
        }
    }
}

/// Cluster membership of a point
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClusterLabel {
    /// Not part of any region
    Noise,
    Cluster(usize),
}

impl ClusterLabel {
    /// Conventional integer form, -1 for noise
    pub fn as_i64(&self) -> i64 {
        match self {
            ClusterLabel::Noise => -1,
            ClusterLabel::Cluster(id) => *id as i64,
        }
    }

    pub fn is_noise(&self) -> bool {
        matches!(self, ClusterLabel::Noise)
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// Points paired 1:1 with their cluster labels
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledPoints {
    points: Vec<LocationPoint>,
    labels: Vec<ClusterLabel>,
}

impl LabeledPoints {
    pub(crate) fn new(points: Vec<LocationPoint>, labels: Vec<ClusterLabel>) -> Self {
        debug_assert_eq!(points.len(), labels.len());
        Self { points, labels }
    }

    pub fn points(&self) -> &[LocationPoint] {
        &self.points
    }

    pub fn labels(&self) -> &[ClusterLabel] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LocationPoint, &ClusterLabel)> {
        self.points.iter().zip(self.labels.iter())
    }

    /// Number of distinct non-noise labels
    pub fn cluster_count(&self) -> usize {
        let mut ids: Vec<usize> = self
            .labels
            .iter()
            .filter_map(|l| match l {
                ClusterLabel::Cluster(id) => Some(*id),
                ClusterLabel::Noise => None,
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_noise()).count()
    }
}
