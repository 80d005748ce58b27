//! Density based clustering (DBSCAN) over (longitude, latitude) pairs

use std::collections::VecDeque;

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use tracing::debug;

use super::point::{ClusterLabel, LabeledPoints, LocationPoint};

/// A point with its index, for neighbourhood queries
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    idx: usize,
    lng: f64,
    lat: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lng, self.lat])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlng = self.lng - point[0];
        let dlat = self.lat - point[1];
        dlng * dlng + dlat * dlat
    }
}

/// Label every point with a cluster id or noise.
///
/// A point is core when at least `min_samples` points (itself included) lie
/// within `eps` degrees of it. Core points reachable from each other form a
/// cluster and non-core points within `eps` of a core point join the first
/// such cluster. Seeds are visited in (longitude, latitude) order, so the
/// partition and the label values only depend on the multiset of points.
pub fn cluster(points: Vec<LocationPoint>, eps: f64, min_samples: usize) -> LabeledPoints {
    let n = points.len();
    let mut labels = vec![ClusterLabel::Noise; n];

    if n == 0 {
        return LabeledPoints::new(points, labels);
    }

    let eps = if eps.is_nan() { 0.0 } else { eps.max(0.0) };
    let eps2 = eps * eps;

    let tree = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(idx, p)| IndexedPoint {
                idx,
                lng: p.longitude,
                lat: p.latitude,
            })
            .collect(),
    );
    let neighbours = |i: usize| -> Vec<usize> {
        let p = &points[i];
        tree.locate_within_distance([p.longitude, p.latitude], eps2)
            .map(|ip| ip.idx)
            .collect()
    };

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| points[a].canonical_cmp(&points[b]).then(a.cmp(&b)));

    let mut visited = vec![false; n];
    let mut next_id = 0;
    let mut queue = VecDeque::new();

    for &i in &order {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let seeds = neighbours(i);
        if seeds.len() < min_samples {
            // may still be absorbed as a border point later
            continue;
        }

        let label = ClusterLabel::Cluster(next_id);
        next_id += 1;
        labels[i] = label;

        for k in seeds {
            if labels[k].is_noise() {
                labels[k] = label;
                queue.push_back(k);
            }
        }

        while let Some(j) = queue.pop_front() {
            if visited[j] {
                continue;
            }
            visited[j] = true;

            let reach = neighbours(j);
            if reach.len() < min_samples {
                continue;
            }
            for k in reach {
                if labels[k].is_noise() {
                    labels[k] = label;
                    queue.push_back(k);
                }
            }
        }
    }

    let labeled = LabeledPoints::new(points, labels);
    debug!(
        points = labeled.len(),
        clusters = labeled.cluster_count(),
        noise = labeled.noise_count(),
        eps,
        min_samples,
        "clustered points"
    );

    labeled
}
