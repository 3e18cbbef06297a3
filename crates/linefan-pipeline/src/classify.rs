//! Direction classification: decide how each member line traverses a
//! shared segment.
//!
//! A member's coordinates are scanned left to right. Hitting the segment's
//! first coordinate before its last means the line runs [`Forward`]
//! through the segment; hitting the last coordinate first means
//! [`Backward`]. The first hit wins, so a line that loops back over the
//! segment's end before reaching its start is reported as backward even
//! if the shared run itself is traversed forward.
//!
//! [`Forward`]: Direction::Forward
//! [`Backward`]: Direction::Backward

use tracing::debug;

use crate::detect::{Overlap, SharedSegment};
use crate::key::CoordMatcher;
use crate::types::{Direction, LineFeatureCollection, Point};

/// A shared segment, the lines holding it, and each line's direction.
///
/// `directions` pairs positionally with `members`. A member whose
/// direction could not be resolved is left out of `directions` rather than
/// given a default, so `directions` may be shorter than `members`; the
/// pairing then stops at the shorter list.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapGroup {
    segment: SharedSegment,
    members: Vec<usize>,
    directions: Vec<Direction>,
}

impl OverlapGroup {
    /// The shared coordinate run.
    #[must_use]
    pub const fn segment(&self) -> &SharedSegment {
        &self.segment
    }

    /// Line indices holding the segment, in first-seen order.
    #[must_use]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Resolved directions, positionally paired with [`members`](Self::members).
    #[must_use]
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// `(line index, direction)` pairs in processing order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, Direction)> + '_ {
        self.members
            .iter()
            .copied()
            .zip(self.directions.iter().copied())
    }

    /// Number of members whose direction was not resolved.
    #[must_use]
    pub fn unmatched(&self) -> usize {
        self.members.len() - self.directions.len()
    }
}

/// Direction in which `line` traverses `segment`, or `None` if the line
/// contains neither of the segment's endpoints.
///
/// # Examples
///
/// ```
/// use linefan_pipeline::{Direction, Point};
/// use linefan_pipeline::classify::classify_direction;
/// use linefan_pipeline::key::CoordMatcher;
///
/// let segment = [Point::new(1.0, 0.0), Point::new(2.0, 0.0)];
/// let line = [Point::new(3.0, 0.0), Point::new(2.0, 0.0), Point::new(1.0, 0.0)];
/// assert_eq!(
///     classify_direction(&segment, &line, &CoordMatcher::EXACT),
///     Some(Direction::Backward),
/// );
/// ```
#[must_use]
pub fn classify_direction(
    segment: &[Point],
    line: &[Point],
    matcher: &CoordMatcher,
) -> Option<Direction> {
    let (&first, &last) = (segment.first()?, segment.last()?);
    line.iter().find_map(|&p| {
        if matcher.matches(p, first) {
            Some(Direction::Forward)
        } else if matcher.matches(p, last) {
            Some(Direction::Backward)
        } else {
            None
        }
    })
}

/// Resolve the direction of every member of one shared segment.
///
/// Members that are out of range or match neither endpoint are omitted.
#[must_use]
pub fn classify_members(
    segment: &[Point],
    members: &[usize],
    lines: &LineFeatureCollection,
    matcher: &CoordMatcher,
) -> Vec<Direction> {
    members
        .iter()
        .filter_map(|&idx| {
            let line = lines.get(idx)?;
            classify_direction(segment, line.points(), matcher)
        })
        .collect()
}

/// Turn detected overlaps into groups with resolved directions.
///
/// Must run against the collection before any offset is written back,
/// since splicing changes the coordinates the classifier scans.
#[must_use]
pub fn build_overlap_groups(
    overlaps: Vec<Overlap>,
    lines: &LineFeatureCollection,
    matcher: &CoordMatcher,
) -> Vec<OverlapGroup> {
    overlaps
        .into_iter()
        .map(|Overlap { segment, members }| {
            let directions = classify_members(segment.points(), &members, lines, matcher);
            let group = OverlapGroup {
                segment,
                members,
                directions,
            };
            if group.unmatched() > 0 {
                debug!(
                    segment = group.segment.key().fingerprint(),
                    unmatched = group.unmatched(),
                    "members without a resolvable direction"
                );
            }
            group
        })
        .collect()
}
