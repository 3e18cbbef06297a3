//! Overlap detection: find coordinate runs shared by two or more lines.
//!
//! For every pair of lines `(i, j)` with `i < j`, all maximal common runs
//! are extracted. Matching is order-preserving: a run counts only when both
//! lines visit its coordinates in the same order. Runs traversed in
//! opposite orders are not overlap at this stage; direction is resolved
//! later by [`crate::classify`].
//!
//! An R\*-tree over line envelopes skips pairs whose bounding boxes are
//! disjoint. Such pairs cannot share a coordinate, so pruning never changes
//! the result, only the amount of work.

use std::collections::HashMap;
use std::hash::BuildHasherDefault;

use geo::BoundingRect;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};
use siphasher::sip::SipHasher13;
use tracing::debug;

use crate::key::{CoordMatcher, SegmentKey};
use crate::types::{LineFeature, LineFeatureCollection, Point};

/// A coordinate sequence common to two or more lines.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedSegment {
    key: SegmentKey,
    points: Vec<Point>,
}

impl SharedSegment {
    /// The segment's coordinates, in the order of the lower-indexed line
    /// that first produced it.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Canonical identity of the segment.
    #[must_use]
    pub const fn key(&self) -> &SegmentKey {
        &self.key
    }

    /// Number of coordinates in the segment.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the segment holds no coordinates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One entry of an [`OverlapMap`]: a shared segment and the lines holding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlap {
    /// The shared coordinate run.
    pub segment: SharedSegment,
    /// Indices of the lines containing the run, in the order they were
    /// first seen. No index appears twice.
    pub members: Vec<usize>,
}

/// Shared segments keyed by identity, in first-found order.
///
/// Iteration order is the order in which each distinct segment was first
/// discovered while scanning line pairs, which makes downstream offset
/// assignment deterministic.
#[derive(Debug, Clone, Default)]
pub struct OverlapMap {
    entries: Vec<Overlap>,
    index: HashMap<SegmentKey, usize, BuildHasherDefault<SipHasher13>>,
}

impl OverlapMap {
    /// Record that lines `a` and `b` share `run`.
    ///
    /// A run already present (same key) gains any new member indices;
    /// otherwise a new entry is appended.
    pub fn insert(&mut self, matcher: &CoordMatcher, run: &[Point], a: usize, b: usize) {
        let key = matcher.key(run);
        let slot = if let Some(&slot) = self.index.get(&key) {
            slot
        } else {
            let slot = self.entries.len();
            self.entries.push(Overlap {
                segment: SharedSegment {
                    key: key.clone(),
                    points: run.to_vec(),
                },
                members: Vec::new(),
            });
            self.index.insert(key, slot);
            slot
        };
        let members = &mut self.entries[slot].members;
        for line in [a, b] {
            if !members.contains(&line) {
                members.push(line);
            }
        }
    }

    /// Number of distinct shared segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no overlap was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The shared segments in first-found order.
    #[must_use]
    pub fn entries(&self) -> &[Overlap] {
        &self.entries
    }

    /// Look up a segment by its coordinates.
    #[must_use]
    pub fn get(&self, matcher: &CoordMatcher, run: &[Point]) -> Option<&Overlap> {
        self.index
            .get(&matcher.key(run))
            .and_then(|&slot| self.entries.get(slot))
    }

    /// Consumes the map and returns its entries in first-found order.
    #[must_use]
    pub fn into_entries(self) -> Vec<Overlap> {
        self.entries
    }
}

/// Work counters from one detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetectStats {
    /// Line pairs whose coordinates were compared.
    pub pairs_tested: usize,
    /// Line pairs skipped because their envelopes are disjoint.
    pub pairs_pruned: usize,
    /// Maximal common runs found across all tested pairs (before merging).
    pub runs_found: usize,
}

/// All maximal common runs between `a` and `b`, each at least two
/// coordinates long.
///
/// A run starting at `a[p] == b[q]` is reported only when `a[p-1]` and
/// `b[q-1]` do not also match, so every reported run is maximal. Runs are
/// returned in order of their start position in `a`, then in `b`. The
/// coordinates of each run are copied from `a`.
///
/// # Examples
///
/// ```
/// use linefan_pipeline::Point;
/// use linefan_pipeline::detect::common_runs;
/// use linefan_pipeline::key::CoordMatcher;
///
/// let a = [Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)];
/// let b = [Point::new(1.0, 0.0), Point::new(2.0, 0.0), Point::new(3.0, 0.0)];
/// let runs = common_runs(&a, &b, &CoordMatcher::EXACT);
/// assert_eq!(runs, vec![vec![Point::new(1.0, 0.0), Point::new(2.0, 0.0)]]);
/// ```
#[must_use]
pub fn common_runs(a: &[Point], b: &[Point], matcher: &CoordMatcher) -> Vec<Vec<Point>> {
    let mut runs = Vec::new();
    for p in 0..a.len() {
        for q in 0..b.len() {
            if !matcher.matches(a[p], b[q]) {
                continue;
            }
            if p > 0 && q > 0 && matcher.matches(a[p - 1], b[q - 1]) {
                // Interior of a run that started earlier.
                continue;
            }
            let mut len = 1;
            while p + len < a.len() && q + len < b.len() && matcher.matches(a[p + len], b[q + len])
            {
                len += 1;
            }
            if len >= 2 {
                runs.push(a[p..p + len].to_vec());
            }
        }
    }
    runs
}

/// Scan every line pair and collect shared segments.
///
/// Pairs are visited in `(i, j)` lexicographic order with `i < j`; within a
/// pair, runs are merged in the order [`common_runs`] returns them. Each
/// merge adds `i` then `j` to the segment's member set.
#[must_use]
pub fn find_overlapping_lines(
    lines: &LineFeatureCollection,
    matcher: &CoordMatcher,
) -> (OverlapMap, DetectStats) {
    let mut map = OverlapMap::default();
    let mut stats = DetectStats::default();
    let n = lines.len();
    if n < 2 {
        return (map, stats);
    }

    let envelopes: Vec<Option<AABB<[f64; 2]>>> = lines
        .lines()
        .iter()
        .map(|line| line_envelope(line, matcher.epsilon()))
        .collect();

    let tree = RTree::bulk_load(
        envelopes
            .iter()
            .enumerate()
            .filter_map(|(idx, env)| {
                env.map(|e| GeomWithData::new(Rectangle::from_aabb(e), idx))
            })
            .collect(),
    );

    for (i, envelope) in envelopes.iter().enumerate() {
        let Some(envelope) = envelope else {
            stats.pairs_pruned += n - i - 1;
            continue;
        };

        let mut candidates: Vec<usize> = tree
            .locate_in_envelope_intersecting(envelope)
            .map(|entry| entry.data)
            .filter(|&j| j > i)
            .collect();
        candidates.sort_unstable();
        stats.pairs_pruned += (n - i - 1) - candidates.len();

        let a = lines.lines()[i].points();
        for j in candidates {
            stats.pairs_tested += 1;
            let b = lines.lines()[j].points();
            for run in common_runs(a, b, matcher) {
                stats.runs_found += 1;
                map.insert(matcher, &run, i, j);
            }
        }
    }

    debug!(
        lines = n,
        pairs_tested = stats.pairs_tested,
        pairs_pruned = stats.pairs_pruned,
        runs = stats.runs_found,
        segments = map.len(),
        "overlap detection finished"
    );

    (map, stats)
}

/// Bounding box of the finite points of `line`, grown by `margin` on every
/// side.
///
/// Non-finite coordinates never match anything, so they are left out of the
/// box. Returns `None` when the line has no finite point at all; such a line
/// is never paired.
fn line_envelope(line: &LineFeature, margin: f64) -> Option<AABB<[f64; 2]>> {
    let geo_line: geo::LineString<f64> = line
        .points()
        .iter()
        .filter(|p| p.is_finite())
        .map(|&p| geo::Coord::from(p))
        .collect();
    let rect = geo_line.bounding_rect()?;
    let (min, max) = (rect.min(), rect.max());
    Some(AABB::from_corners(
        [min.x - margin, min.y - margin],
        [max.x + margin, max.y + margin],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(coords: &[(f64, f64)]) -> LineFeature {
        LineFeature::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    // --- common_runs ---

    #[test]
    fn disjoint_lines_have_no_runs() {
        let a = pts(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = pts(&[(0.0, 1.0), (1.0, 1.0)]);
        assert!(common_runs(&a, &b, &CoordMatcher::EXACT).is_empty());
    }

    #[test]
    fn single_shared_vertex_is_not_a_run() {
        let a = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let b = pts(&[(2.0, 0.0), (3.0, 0.0), (4.0, 0.0)]);
        assert!(common_runs(&a, &b, &CoordMatcher::EXACT).is_empty());
    }

    #[test]
    fn identical_lines_share_one_full_run() {
        let a = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 1.0)]);
        let runs = common_runs(&a, &a, &CoordMatcher::EXACT);
        assert_eq!(runs, vec![a]);
    }

    #[test]
    fn reversed_lines_share_no_run() {
        let a = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let b: Vec<Point> = a.iter().rev().copied().collect();
        assert!(common_runs(&a, &b, &CoordMatcher::EXACT).is_empty());
    }

    #[test]
    fn runs_are_maximal_and_split_by_divergence() {
        // Shared (0,0)-(1,0), then a detour on b, then shared (3,0)-(4,0)-(5,0).
        let a = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0), (5.0, 0.0)]);
        let b = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 1.0), (3.0, 0.0), (4.0, 0.0), (5.0, 0.0)]);
        let runs = common_runs(&a, &b, &CoordMatcher::EXACT);
        assert_eq!(
            runs,
            vec![
                pts(&[(0.0, 0.0), (1.0, 0.0)]),
                pts(&[(3.0, 0.0), (4.0, 0.0), (5.0, 0.0)]),
            ]
        );
    }

    #[test]
    fn tolerant_runs_copy_coordinates_from_first_line() {
        let a = pts(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = pts(&[(0.000_000_1, 0.0), (1.0, 0.000_000_1)]);
        assert!(common_runs(&a, &b, &CoordMatcher::EXACT).is_empty());
        let runs = common_runs(&a, &b, &CoordMatcher::new(1e-6));
        assert_eq!(runs, vec![a]);
    }

    // --- find_overlapping_lines ---

    #[test]
    fn chained_overlaps_produce_two_groups() {
        let lines = LineFeatureCollection::new(vec![
            line(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]),
            line(&[(1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]),
            line(&[(2.0, 0.0), (3.0, 0.0), (4.0, 0.0)]),
        ]);
        let (map, stats) = find_overlapping_lines(&lines, &CoordMatcher::EXACT);

        assert_eq!(map.len(), 2);
        let first = &map.entries()[0];
        assert_eq!(first.segment.points(), pts(&[(1.0, 0.0), (2.0, 0.0)]).as_slice());
        assert_eq!(first.members, vec![0, 1]);
        let second = &map.entries()[1];
        assert_eq!(second.segment.points(), pts(&[(2.0, 0.0), (3.0, 0.0)]).as_slice());
        assert_eq!(second.members, vec![1, 2]);
        assert_eq!(stats.pairs_tested, 3);
    }

    #[test]
    fn three_coincident_lines_merge_into_one_group() {
        let shared = [(0.0, 0.0), (1.0, 1.0), (2.0, 1.0)];
        let lines = LineFeatureCollection::new(vec![line(&shared), line(&shared), line(&shared)]);
        let (map, stats) = find_overlapping_lines(&lines, &CoordMatcher::EXACT);
        assert_eq!(map.len(), 1);
        assert_eq!(map.entries()[0].members, vec![0, 1, 2]);
        assert_eq!(stats.runs_found, 3);
    }

    #[test]
    fn members_keep_insertion_order() {
        // Every pair shares the run; members accumulate in pair-scan order
        // and repeated indices are dropped.
        let shared = [(5.0, 5.0), (6.0, 5.0)];
        let lines = LineFeatureCollection::new(vec![
            line(&[(4.0, 5.0), shared[0], shared[1]]),
            line(&[shared[0], shared[1], (7.0, 6.0)]),
            line(&[(5.0, 4.0), shared[0], shared[1]]),
            line(&[shared[0], shared[1], (6.0, 9.0)]),
        ]);
        let (map, _) = find_overlapping_lines(&lines, &CoordMatcher::EXACT);
        assert_eq!(map.len(), 1);
        assert_eq!(map.entries()[0].members, vec![0, 1, 2, 3]);
    }

    #[test]
    fn far_apart_lines_are_pruned() {
        let lines = LineFeatureCollection::new(vec![
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(100.0, 100.0), (101.0, 100.0)]),
        ]);
        let (map, stats) = find_overlapping_lines(&lines, &CoordMatcher::EXACT);
        assert!(map.is_empty());
        assert_eq!(stats.pairs_tested, 0);
        assert_eq!(stats.pairs_pruned, 1);
    }

    #[test]
    fn empty_line_is_never_paired() {
        let lines = LineFeatureCollection::new(vec![
            LineFeature::default(),
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(0.0, 0.0), (1.0, 0.0)]),
        ]);
        let (map, stats) = find_overlapping_lines(&lines, &CoordMatcher::EXACT);
        assert_eq!(map.len(), 1);
        assert_eq!(map.entries()[0].members, vec![1, 2]);
        assert_eq!(stats.pairs_pruned, 2);
    }

    #[test]
    fn non_finite_vertex_does_not_hide_a_shared_run() {
        let lines = LineFeatureCollection::new(vec![
            line(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]),
            line(&[(f64::NAN, 5.0), (0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]),
        ]);
        let (map, stats) = find_overlapping_lines(&lines, &CoordMatcher::EXACT);
        assert_eq!(stats.pairs_tested, 1);
        assert_eq!(stats.pairs_pruned, 0);
        assert_eq!(map.len(), 1);
        assert_eq!(map.entries()[0].members, vec![0, 1]);
        assert_eq!(map.entries()[0].segment.len(), 3);
    }

    #[test]
    fn all_non_finite_line_is_never_paired() {
        let lines = LineFeatureCollection::new(vec![
            line(&[(f64::NAN, 0.0), (f64::INFINITY, 1.0)]),
            line(&[(0.0, 0.0), (1.0, 0.0)]),
        ]);
        let (map, stats) = find_overlapping_lines(&lines, &CoordMatcher::EXACT);
        assert!(map.is_empty());
        assert_eq!(stats.pairs_pruned, 1);
    }

    #[test]
    fn lookup_by_coordinates() {
        let lines = LineFeatureCollection::new(vec![
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(0.0, 0.0), (1.0, 0.0)]),
        ]);
        let (map, _) = find_overlapping_lines(&lines, &CoordMatcher::EXACT);
        let m = CoordMatcher::EXACT;
        assert!(map.get(&m, &pts(&[(0.0, 0.0), (1.0, 0.0)])).is_some());
        assert!(map.get(&m, &pts(&[(1.0, 0.0), (0.0, 0.0)])).is_none());
    }
}
