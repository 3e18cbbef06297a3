//! Final cleanup: drop coordinates that offsetting turned non-finite.
//!
//! Offsetting a zero-length segment divides by zero and yields NaN
//! coordinates. They are removed here, once, after every group has been
//! processed.

use tracing::debug;

use crate::types::{LineFeatureCollection, Point};

/// Remove every coordinate with a NaN or infinite component from every
/// line. Returns the number of coordinates removed.
pub fn clean_lines(lines: &mut LineFeatureCollection) -> usize {
    let mut removed = 0;
    for line in lines.iter_mut() {
        let before = line.len();
        line.retain_points(|p| Point::is_finite(*p));
        removed += before - line.len();
    }
    if removed > 0 {
        debug!(removed, "dropped non-finite coordinates");
    }
    removed
}
