//! Parallel offset of a polyline by a distance in meters.
//!
//! Follows the widespread web-mapping `lineOffset` convention so output
//! lines up with what map front ends already draw:
//!
//! - the distance is converted to degrees with a spherical Earth of
//!   radius [`EARTH_RADIUS_M`], without any latitude correction;
//! - each segment is displaced perpendicular to itself, a positive
//!   distance moving it to the right of the direction of travel;
//! - consecutive displaced segments are joined at the intersection of
//!   their supporting lines, or keep their own endpoints when parallel.
//!
//! The output always has as many coordinates as the input. A zero-length
//! segment has no direction and yields NaN coordinates, which the final
//! cleanup pass removes.

use crate::types::Point;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Convert a ground distance in meters to degrees of arc.
#[must_use]
pub fn meters_to_degrees(meters: f64) -> f64 {
    (meters / EARTH_RADIUS_M).to_degrees()
}

/// Offset `points` laterally by `distance_m` meters.
///
/// Inputs with fewer than two points have no direction and are returned
/// unchanged.
///
/// # Examples
///
/// ```
/// use linefan_pipeline::Point;
/// use linefan_pipeline::offset::{line_offset, meters_to_degrees};
///
/// let line = [Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
/// let shifted = line_offset(&line, 3.0);
/// // Eastbound, so a positive distance moves it south.
/// assert!((shifted[0].y + meters_to_degrees(3.0)).abs() < 1e-12);
/// assert_eq!(shifted.len(), line.len());
/// ```
#[must_use]
pub fn line_offset(points: &[Point], distance_m: f64) -> Vec<Point> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let offset = meters_to_degrees(distance_m);
    let mut segments: Vec<(Point, Point)> = points
        .windows(2)
        .map(|w| offset_segment(w[0], w[1], offset))
        .collect();

    // Pull each shared vertex to the intersection of the two displaced
    // segments that meet there.
    for k in 1..segments.len() {
        if let Some(ix) = supporting_line_intersection(segments[k - 1], segments[k]) {
            segments[k - 1].1 = ix;
            segments[k].0 = ix;
        }
    }

    let mut out = Vec::with_capacity(points.len());
    out.extend(segments.iter().map(|&(start, _)| start));
    if let Some(&(_, end)) = segments.last() {
        out.push(end);
    }
    out
}

/// Displace the segment `a -> b` by `offset` degrees to its right.
fn offset_segment(a: Point, b: Point, offset: f64) -> (Point, Point) {
    let length = (a.x - b.x).hypot(a.y - b.y);
    let dx = offset * (b.y - a.y) / length;
    let dy = offset * (a.x - b.x) / length;
    (
        Point::new(a.x + dx, a.y + dy),
        Point::new(b.x + dx, b.y + dy),
    )
}

/// Intersection of the infinite lines through two segments.
///
/// Returns `None` only when the lines are exactly parallel. Degenerate
/// (NaN) input propagates into the result instead of being rejected.
fn supporting_line_intersection(first: (Point, Point), second: (Point, Point)) -> Option<Point> {
    let (p, r) = (first.0, sub(first.1, first.0));
    let (q, s) = (second.0, sub(second.1, second.0));
    let denominator = cross(r, s);
    if denominator == 0.0 {
        return None;
    }
    let t = cross(sub(q, p), s) / denominator;
    Some(Point::new(t.mul_add(r.x, p.x), t.mul_add(r.y, p.y)))
}

fn sub(a: Point, b: Point) -> Point {
    Point::new(a.x - b.x, a.y - b.y)
}

fn cross(a: Point, b: Point) -> f64 {
    a.x.mul_add(b.y, -(a.y * b.x))
}
