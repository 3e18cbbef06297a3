//! Write offset geometry back into a line, in place.

use crate::key::CoordMatcher;
use crate::types::{LineFeature, Point};

/// Overwrite the first occurrence of `original` in `line` with
/// `replacement`.
///
/// Candidate start positions are scanned left to right and the first run
/// matching `original` element by element is replaced. The line's point
/// count never changes. Returns `false` without touching the line when
/// `original` is empty, the two runs differ in length, or no occurrence
/// exists (for example because an earlier group already moved those
/// coordinates).
///
/// # Examples
///
/// ```
/// use linefan_pipeline::{LineFeature, Point};
/// use linefan_pipeline::key::CoordMatcher;
/// use linefan_pipeline::splice::replace_segment;
///
/// let mut line = LineFeature::new(vec![
///     Point::new(0.0, 0.0),
///     Point::new(1.0, 0.0),
///     Point::new(2.0, 0.0),
/// ]);
/// let original = [Point::new(1.0, 0.0), Point::new(2.0, 0.0)];
/// let moved = [Point::new(1.0, -1.0), Point::new(2.0, -1.0)];
/// assert!(replace_segment(&mut line, &original, &moved, &CoordMatcher::EXACT));
/// assert_eq!(line.points()[2], Point::new(2.0, -1.0));
/// ```
pub fn replace_segment(
    line: &mut LineFeature,
    original: &[Point],
    replacement: &[Point],
    matcher: &CoordMatcher,
) -> bool {
    if original.is_empty() || original.len() != replacement.len() {
        return false;
    }
    let Some(start) = find_run(line.points(), original, matcher) else {
        return false;
    };
    line.points_mut()[start..start + original.len()].copy_from_slice(replacement);
    true
}

/// Start index of the first run in `haystack` matching `needle`.
#[must_use]
pub fn find_run(haystack: &[Point], needle: &[Point], matcher: &CoordMatcher) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| matcher.runs_match(window, needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn replaces_interior_run() {
        let mut line = LineFeature::new(pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]));
        let original = pts(&[(1.0, 0.0), (2.0, 0.0)]);
        let replacement = pts(&[(1.0, 0.5), (2.0, 0.5)]);
        assert!(replace_segment(&mut line, &original, &replacement, &CoordMatcher::EXACT));
        assert_eq!(
            line.points(),
            pts(&[(0.0, 0.0), (1.0, 0.5), (2.0, 0.5), (3.0, 0.0)]).as_slice()
        );
    }

    #[test]
    fn only_first_occurrence_is_replaced() {
        let run = [(0.0, 0.0), (1.0, 0.0)];
        let mut line = LineFeature::new(pts(&[run[0], run[1], (1.0, 1.0), run[0], run[1]]));
        let replacement = pts(&[(0.0, 9.0), (1.0, 9.0)]);
        assert!(replace_segment(&mut line, &pts(&run), &replacement, &CoordMatcher::EXACT));
        assert_eq!(line.points()[0], Point::new(0.0, 9.0));
        assert_eq!(line.points()[3], Point::new(0.0, 0.0));
    }

    #[test]
    fn missing_run_leaves_line_untouched() {
        let original_line = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let mut line = LineFeature::new(original_line.clone());
        let reversed = pts(&[(2.0, 0.0), (1.0, 0.0)]);
        let replacement = pts(&[(2.0, 1.0), (1.0, 1.0)]);
        assert!(!replace_segment(&mut line, &reversed, &replacement, &CoordMatcher::EXACT));
        assert_eq!(line.points(), original_line.as_slice());
    }

    #[test]
    fn length_mismatch_is_a_no_op() {
        let mut line = LineFeature::new(pts(&[(0.0, 0.0), (1.0, 0.0)]));
        let original = pts(&[(0.0, 0.0), (1.0, 0.0)]);
        assert!(!replace_segment(&mut line, &original, &original[..1], &CoordMatcher::EXACT));
        assert!(!replace_segment(&mut line, &[], &[], &CoordMatcher::EXACT));
    }

    #[test]
    fn run_longer_than_line_is_not_found() {
        let line = pts(&[(0.0, 0.0), (1.0, 0.0)]);
        let needle = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(find_run(&line, &needle, &CoordMatcher::EXACT), None);
    }

    #[test]
    fn tolerant_match_finds_drifted_run() {
        let line = pts(&[(0.0, 0.0), (1.000_000_1, 0.0), (2.0, 0.0)]);
        let needle = pts(&[(1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(find_run(&line, &needle, &CoordMatcher::EXACT), None);
        assert_eq!(find_run(&line, &needle, &CoordMatcher::new(1e-6)), Some(1));
    }
}
