//! Exact point-in-polygon tests.
//!
//! Containment uses the even-odd rule: a horizontal ray cast from the query
//! point toward +x toggles "inside" at every edge it crosses. The boundary is
//! inclusive: a point within [`BOUNDARY_EPSILON`] degrees of any edge of the
//! outer ring or of a hole counts as contained.

use geo::line_intersection::{line_intersection, LineIntersection};
use geo_types::{Coord, Line};

use crate::models::zone::unwrap_lon;
use crate::models::{Coordinate, Polygon, Ring};

/// Distance in degrees within which a point is considered on an edge
pub const BOUNDARY_EPSILON: f64 = 1e-9;

/// Where a point lies relative to a single ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingPosition {
    Inside,
    Outside,
    Boundary,
}

/// Test whether `polygon` contains `coordinate`.
///
/// Points on the ±180° meridian are also tested at their alias, so a
/// polygon touching either side of the antimeridian claims them.
pub fn contains(polygon: &Polygon, coordinate: Coordinate) -> bool {
    if contains_lon_lat(polygon, coordinate.lon, coordinate.lat) {
        return true;
    }

    // Crossing polygons already fold both aliases onto 180 via unwrap_lon
    if polygon.crosses_antimeridian {
        return false;
    }

    coordinate
        .antimeridian_alias()
        .map(|alias| contains_lon_lat(polygon, alias.lon, alias.lat))
        .unwrap_or(false)
}

fn contains_lon_lat(polygon: &Polygon, lon: f64, lat: f64) -> bool {
    let x = if polygon.crosses_antimeridian {
        unwrap_lon(lon)
    } else {
        lon
    };

    if !polygon.bbox.contains(x, lat) {
        return false;
    }

    if ring_position(&polygon.outer, x, lat) == RingPosition::Outside {
        return false;
    }

    !polygon
        .holes
        .iter()
        .any(|hole| ring_position(hole, x, lat) == RingPosition::Inside)
}

/// Classify `(x, y)` against a closed ring.
pub fn ring_position(ring: &Ring, x: f64, y: f64) -> RingPosition {
    let mut inside = false;

    for (a, b) in ring.edges() {
        if on_segment(a, b, x, y) {
            return RingPosition::Boundary;
        }

        // Half-open on y so a vertex shared by two edges is counted once
        if (a.y > y) != (b.y > y) {
            let x_cross = (b.x - a.x) * (y - a.y) / (b.y - a.y) + a.x;
            if x < x_cross {
                inside = !inside;
            }
        }
    }

    if inside {
        RingPosition::Inside
    } else {
        RingPosition::Outside
    }
}

fn on_segment(a: Coord<f64>, b: Coord<f64>, x: f64, y: f64) -> bool {
    if x < a.x.min(b.x) - BOUNDARY_EPSILON
        || x > a.x.max(b.x) + BOUNDARY_EPSILON
        || y < a.y.min(b.y) - BOUNDARY_EPSILON
        || y > a.y.max(b.y) + BOUNDARY_EPSILON
    {
        return false;
    }

    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return true;
    }

    let cross = dx * (y - a.y) - dy * (x - a.x);
    cross.abs() / len <= BOUNDARY_EPSILON
}

/// Best-effort self-intersection check over all non-adjacent edge pairs.
///
/// Only proper crossings count; edges that touch or overlap collinearly
/// are accepted.
pub fn ring_self_intersects(ring: &Ring) -> bool {
    let edges: Vec<Line<f64>> = ring.edges().map(|(a, b)| Line::new(a, b)).collect();
    let n = edges.len();

    for i in 0..n {
        for j in (i + 2)..n {
            // First and last edges share the closing vertex
            if i == 0 && j == n - 1 {
                continue;
            }
            if let Some(LineIntersection::SinglePoint {
                is_proper: true, ..
            }) = line_intersection(edges[i], edges[j])
            {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Ring {
        Ring::from_lon_lat(&[[min, min], [max, min], [max, max], [min, max]])
    }

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_ring_position_basic() {
        let ring = square(0.0, 10.0);
        assert_eq!(ring_position(&ring, 5.0, 5.0), RingPosition::Inside);
        assert_eq!(ring_position(&ring, 15.0, 5.0), RingPosition::Outside);
        assert_eq!(ring_position(&ring, -1.0, 5.0), RingPosition::Outside);
    }

    #[test]
    fn test_ring_position_boundary() {
        let ring = square(0.0, 10.0);
        // Vertex
        assert_eq!(ring_position(&ring, 0.0, 0.0), RingPosition::Boundary);
        assert_eq!(ring_position(&ring, 10.0, 10.0), RingPosition::Boundary);
        // Edges
        assert_eq!(ring_position(&ring, 10.0, 5.0), RingPosition::Boundary);
        assert_eq!(ring_position(&ring, 3.0, 0.0), RingPosition::Boundary);
    }

    #[test]
    fn test_ring_position_diagonal_edge() {
        let ring = Ring::from_lon_lat(&[[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]]);
        assert_eq!(ring_position(&ring, 5.0, 5.0), RingPosition::Boundary);
        assert_eq!(ring_position(&ring, 2.0, 2.0), RingPosition::Inside);
        assert_eq!(ring_position(&ring, 6.0, 6.0), RingPosition::Outside);
    }

    #[test]
    fn test_ray_through_vertex_counts_once() {
        // Concave ring where the ray at y=5 passes exactly through vertex (5, 5)
        let ring = Ring::from_lon_lat(&[
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [5.0, 5.0],
            [0.0, 10.0],
        ]);
        assert_eq!(ring_position(&ring, 1.0, 5.0), RingPosition::Inside);
        assert_eq!(ring_position(&ring, 9.0, 5.0), RingPosition::Inside);
        assert_eq!(ring_position(&ring, 5.0, 8.0), RingPosition::Outside);
    }

    #[test]
    fn test_contains_with_hole() {
        let poly = Polygon::new(square(0.0, 10.0), vec![square(4.0, 6.0)]);
        assert!(contains(&poly, coord(2.0, 2.0)));
        assert!(!contains(&poly, coord(5.0, 5.0)));
        // Hole edge is part of the boundary, hence contained
        assert!(contains(&poly, coord(5.0, 4.0)));
        assert!(!contains(&poly, coord(20.0, 20.0)));
    }

    #[test]
    fn test_contains_is_inclusive_on_outer_boundary() {
        let poly = Polygon::new(square(0.0, 10.0), vec![]);
        assert!(contains(&poly, coord(0.0, 0.0)));
        assert!(contains(&poly, coord(10.0, 7.5)));
    }

    #[test]
    fn test_contains_antimeridian_crossing() {
        let outer = Ring::from_lon_lat(&[
            [177.0, -20.0],
            [-178.0, -20.0],
            [-178.0, -15.0],
            [177.0, -15.0],
        ]);
        let poly = Polygon::new(outer, vec![]);
        assert!(contains(&poly, coord(-17.5, 179.9)));
        assert!(contains(&poly, coord(-17.5, -179.9)));
        assert!(contains(&poly, coord(-17.5, 180.0)));
        assert!(contains(&poly, coord(-17.5, -180.0)));
        assert!(!contains(&poly, coord(-17.5, 176.0)));
        assert!(!contains(&poly, coord(-17.5, -177.0)));
        assert!(!contains(&poly, coord(-17.5, 0.0)));
    }

    #[test]
    fn test_contains_antimeridian_crossing_with_hole() {
        let outer = Ring::from_lon_lat(&[
            [170.0, -30.0],
            [-170.0, -30.0],
            [-170.0, -10.0],
            [170.0, -10.0],
        ]);
        let hole = Ring::from_lon_lat(&[
            [178.0, -22.0],
            [-178.0, -22.0],
            [-178.0, -18.0],
            [178.0, -18.0],
        ]);
        let poly = Polygon::new(outer, vec![hole]);
        assert!(!contains(&poly, coord(-20.0, 179.5)));
        assert!(!contains(&poly, coord(-20.0, -179.5)));
        assert!(contains(&poly, coord(-20.0, 175.0)));
        assert!(contains(&poly, coord(-20.0, -175.0)));
    }

    #[test]
    fn test_contains_meridian_alias_for_non_crossing() {
        // Eastern half touching 180, western half touching -180
        let east = Polygon::new(
            Ring::from_lon_lat(&[[170.0, 0.0], [180.0, 0.0], [180.0, 10.0], [170.0, 10.0]]),
            vec![],
        );
        let west = Polygon::new(
            Ring::from_lon_lat(&[[-180.0, 0.0], [-170.0, 0.0], [-170.0, 10.0], [-180.0, 10.0]]),
            vec![],
        );
        assert!(!east.crosses_antimeridian);
        assert!(contains(&east, coord(5.0, -180.0)));
        assert!(contains(&west, coord(5.0, 180.0)));
    }

    #[test]
    fn test_ring_self_intersects() {
        let bowtie = Ring::from_lon_lat(&[[0.0, 0.0], [2.0, 2.0], [2.0, 0.0], [0.0, 2.0]]);
        assert!(ring_self_intersects(&bowtie));
        assert!(!ring_self_intersects(&square(0.0, 1.0)));
        let triangle = Ring::from_lon_lat(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        assert!(!ring_self_intersects(&triangle));
    }

    #[test]
    fn test_ring_touching_itself_is_not_crossing() {
        // Vertex (2, 0) lies on the first edge without crossing it
        let pinched = Ring::from_lon_lat(&[
            [0.0, 0.0],
            [4.0, 0.0],
            [4.0, 4.0],
            [2.0, 0.0],
            [0.0, 4.0],
        ]);
        assert!(!ring_self_intersects(&pinched));

        let crossing = Ring::from_lon_lat(&[
            [0.0, 0.0],
            [4.0, 0.0],
            [0.0, 4.0],
            [4.0, 4.0],
        ]);
        assert!(ring_self_intersects(&crossing));
    }
}
