//! Point in region tests, by triangulation of each region

use geo::algorithm::TriangulateEarcut;
use geo::geometry::Coord;
use tracing::warn;

use super::boundary::Region;
use super::point::LocationPoint;

/// Outcome of testing one region
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionMatch {
    Matched,
    NotMatched,
    /// The region could not be triangulated
    Failed,
}

/// Test whether `point` falls inside `region`, boundary included
pub fn test_region(point: &LocationPoint, region: &Region) -> RegionMatch {
    if !point.is_finite() {
        return RegionMatch::NotMatched;
    }

    let triangles = region.polygon().earcut_triangles();
    if triangles.is_empty() {
        return RegionMatch::Failed;
    }

    let q = Coord::from(*point);
    if triangles.iter().any(|t| triangle_contains(t.to_array(), q)) {
        RegionMatch::Matched
    } else {
        RegionMatch::NotMatched
    }
}

/// Whether `point` falls inside any of `regions`.
///
/// A region that fails to triangulate counts as not matching, so broken
/// geometry can only make a point look novel.
pub fn is_inside(point: &LocationPoint, regions: &[Region]) -> bool {
    regions.iter().any(|region| match test_region(point, region) {
        RegionMatch::Matched => true,
        RegionMatch::NotMatched => false,
        RegionMatch::Failed => {
            warn!(label = region.label, "Failed on triangulate region, treated as no match");
            false
        }
    })
}

fn triangle_contains(t: [Coord; 3], q: Coord) -> bool {
    let cross = |a: Coord, b: Coord| (b.x - a.x) * (q.y - a.y) - (b.y - a.y) * (q.x - a.x);

    let area2 = (t[1].x - t[0].x) * (t[2].y - t[0].y) - (t[1].y - t[0].y) * (t[2].x - t[0].x);
    if area2 == 0.0 || !area2.is_finite() {
        return false;
    }

    // a few ulps of the largest coordinate, scaled by the longest edge
    let magnitude = t
        .iter()
        .chain(std::iter::once(&q))
        .fold(1.0f64, |m, c| m.max(c.x.abs()).max(c.y.abs()));
    let longest = (0..3)
        .map(|i| {
            let (a, b) = (t[i], t[(i + 1) % 3]);
            (b.x - a.x).hypot(b.y - a.y)
        })
        .fold(0.0f64, f64::max);
    let tol = 1e-12 * magnitude * longest;

    let d = [cross(t[0], t[1]), cross(t[1], t[2]), cross(t[2], t[0])];
    let has_neg = d.iter().any(|v| *v < -tol);
    let has_pos = d.iter().any(|v| *v > tol);

    !(has_neg && has_pos)
}
