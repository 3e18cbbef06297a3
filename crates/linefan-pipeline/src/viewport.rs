//! Viewport visibility filter.
//!
//! Selects the lines that have at least one vertex inside a bounding
//! polygon. This is independent of the offset pipeline: callers typically
//! filter to the visible lines first and then fan out only those.

use geo::{Intersects, Polygon, Rect};

use crate::types::{LineFeature, LineFeatureCollection};

/// Axis-aligned bounding polygon from its corner coordinates.
///
/// The corners may be given in any order.
#[must_use]
pub fn bounds_polygon(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
    Rect::new(
        geo::Coord { x: min_x, y: min_y },
        geo::Coord { x: max_x, y: max_y },
    )
    .to_polygon()
}

/// Returns `true` if any vertex of `line` lies inside `bounds` or on its
/// boundary. Stops at the first such vertex.
#[must_use]
pub fn is_line_in_view(bounds: &Polygon<f64>, line: &LineFeature) -> bool {
    line.points()
        .iter()
        .any(|&p| bounds.intersects(&geo::Coord::from(p)))
}

/// Indices of the lines with at least one vertex inside `bounds`, in
/// collection order.
///
/// # Examples
///
/// ```
/// use linefan_pipeline::{LineFeature, LineFeatureCollection, Point};
/// use linefan_pipeline::viewport::{bounds_polygon, lines_in_view};
///
/// let lines = LineFeatureCollection::new(vec![
///     LineFeature::new(vec![Point::new(-1.0, -1.0), Point::new(0.5, 0.5)]),
///     LineFeature::new(vec![Point::new(5.0, 5.0), Point::new(6.0, 6.0)]),
/// ]);
/// let view = bounds_polygon(0.0, 0.0, 1.0, 1.0);
/// assert_eq!(lines_in_view(&view, &lines), vec![0]);
/// ```
#[must_use]
pub fn lines_in_view(bounds: &Polygon<f64>, lines: &LineFeatureCollection) -> Vec<usize> {
    lines
        .lines()
        .iter()
        .enumerate()
        .filter(|(_, line)| is_line_in_view(bounds, line))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn line(coords: &[(f64, f64)]) -> LineFeature {
        LineFeature::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn vertex_on_boundary_counts_as_visible() {
        let bounds = bounds_polygon(0.0, 0.0, 1.0, 1.0);
        assert!(is_line_in_view(&bounds, &line(&[(1.0, 0.5), (2.0, 0.5)])));
    }

    #[test]
    fn crossing_without_interior_vertex_is_not_visible() {
        // The segment passes through the box but neither vertex is inside.
        let bounds = bounds_polygon(0.0, 0.0, 1.0, 1.0);
        assert!(!is_line_in_view(&bounds, &line(&[(-1.0, 0.5), (2.0, 0.5)])));
    }

    #[test]
    fn empty_line_is_not_visible() {
        let bounds = bounds_polygon(0.0, 0.0, 1.0, 1.0);
        assert!(!is_line_in_view(&bounds, &LineFeature::default()));
    }

    #[test]
    fn corners_in_any_order() {
        let bounds = bounds_polygon(1.0, 1.0, 0.0, 0.0);
        assert!(is_line_in_view(&bounds, &line(&[(0.5, 0.5)])));
    }

    #[test]
    fn non_rectangular_bounds() {
        let triangle = Polygon::new(
            geo::LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (0.0, 0.0)]),
            vec![],
        );
        let lines = LineFeatureCollection::new(vec![
            line(&[(3.0, 3.0), (5.0, 5.0)]),
            line(&[(10.0, 10.0), (1.0, 1.0)]),
        ]);
        assert_eq!(lines_in_view(&triangle, &lines), vec![1]);
    }
}
