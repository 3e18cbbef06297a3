//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! [`crate::fan_out`] runs every stage in one call. [`Pipeline`] lets the
//! caller drive execution one step at a time:
//!
//! ```rust
//! # use linefan_pipeline::{LineFeature, LineFeatureCollection, OffsetConfig, Pipeline, Point};
//! let shared = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
//! let mut lines = LineFeatureCollection::new(vec![
//!     LineFeature::new(shared.clone()),
//!     LineFeature::new(shared),
//! ]);
//!
//! let detected = Pipeline::new(&mut lines, OffsetConfig::default()).detect();
//! assert_eq!(detected.overlaps().len(), 1);
//!
//! let summary = detected.classify().apply_offsets().clean().into_summary();
//! assert_eq!(summary.offsets_applied, 2);
//! ```
//!
//! Each stage method consumes `self` and returns the next state, so stages
//! cannot be skipped or reordered. In particular, directions are always
//! classified before the first offset is written back.
//!
//! The stages borrow the collection mutably for their whole lifetime and
//! only write to it from [`Classified::apply_offsets`] onward.

use crate::assign::{AssignStats, apply_offsets};
use crate::classify::{OverlapGroup, build_overlap_groups};
use crate::detect::{DetectStats, Overlap, find_overlapping_lines};
use crate::key::CoordMatcher;
use crate::types::{FanOutSummary, LineFeatureCollection, OffsetConfig};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`detect`](Self::detect) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing, call .detect() to continue"]
pub struct Pending<'a> {
    lines: &'a mut LineFeatureCollection,
    config: OffsetConfig,
    matcher: CoordMatcher,
}

impl<'a> Pending<'a> {
    /// The collection that will be processed.
    #[must_use]
    pub fn lines(&self) -> &LineFeatureCollection {
        self.lines
    }

    /// The configuration the pipeline runs with.
    #[must_use]
    pub const fn config(&self) -> &OffsetConfig {
        &self.config
    }

    /// Find every shared segment and advance to [`Detected`].
    pub fn detect(self) -> Detected<'a> {
        let (map, stats) = find_overlapping_lines(self.lines, &self.matcher);
        Detected {
            lines: self.lines,
            config: self.config,
            matcher: self.matcher,
            overlaps: map.into_entries(),
            stats,
        }
    }
}

// ───────────────────────── Stage 1: Detected ─────────────────────────

/// Pipeline state after overlap detection.
///
/// Call [`classify`](Self::classify) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing, call .classify() to continue"]
pub struct Detected<'a> {
    lines: &'a mut LineFeatureCollection,
    config: OffsetConfig,
    matcher: CoordMatcher,
    overlaps: Vec<Overlap>,
    stats: DetectStats,
}

impl<'a> Detected<'a> {
    /// Shared segments in first-found order.
    #[must_use]
    pub fn overlaps(&self) -> &[Overlap] {
        &self.overlaps
    }

    /// Work counters from the detection pass.
    #[must_use]
    pub const fn detect_stats(&self) -> DetectStats {
        self.stats
    }

    /// Resolve member directions and advance to [`Classified`].
    pub fn classify(self) -> Classified<'a> {
        let groups = build_overlap_groups(self.overlaps, self.lines, &self.matcher);
        Classified {
            lines: self.lines,
            config: self.config,
            matcher: self.matcher,
            groups,
        }
    }
}

// ───────────────────────── Stage 2: Classified ───────────────────────

/// Pipeline state after direction classification.
///
/// Nothing has been written to the collection yet. Call
/// [`apply_offsets`](Self::apply_offsets) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing, call .apply_offsets() to continue"]
pub struct Classified<'a> {
    lines: &'a mut LineFeatureCollection,
    config: OffsetConfig,
    matcher: CoordMatcher,
    groups: Vec<OverlapGroup>,
}

impl<'a> Classified<'a> {
    /// Overlap groups with their member directions.
    #[must_use]
    pub fn groups(&self) -> &[OverlapGroup] {
        &self.groups
    }

    /// Members whose direction could not be resolved, across all groups.
    #[must_use]
    pub fn unmatched_directions(&self) -> usize {
        self.groups.iter().map(OverlapGroup::unmatched).sum()
    }

    /// Write lateral offsets into the collection and advance to [`Offset`].
    pub fn apply_offsets(self) -> Offset<'a> {
        let stats = apply_offsets(&self.groups, self.lines, &self.config, &self.matcher);
        let unmatched = self.unmatched_directions();
        Offset {
            lines: self.lines,
            group_count: self.groups.len(),
            unmatched,
            stats,
        }
    }
}

// ───────────────────────── Stage 3: Offset ───────────────────────────

/// Pipeline state after offsets have been spliced into the collection.
///
/// The collection may hold non-finite coordinates at this point. Call
/// [`clean`](Self::clean) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing, call .clean() to continue"]
pub struct Offset<'a> {
    lines: &'a mut LineFeatureCollection,
    group_count: usize,
    unmatched: usize,
    stats: AssignStats,
}

impl<'a> Offset<'a> {
    /// Counters from the offset pass.
    #[must_use]
    pub const fn stats(&self) -> AssignStats {
        self.stats
    }

    /// The collection with offsets applied.
    #[must_use]
    pub fn lines(&self) -> &LineFeatureCollection {
        self.lines
    }

    /// Drop non-finite coordinates and advance to [`Cleaned`].
    pub fn clean(self) -> Cleaned<'a> {
        let removed = crate::clean::clean_lines(self.lines);
        Cleaned {
            lines: self.lines,
            group_count: self.group_count,
            unmatched: self.unmatched,
            stats: self.stats,
            removed,
        }
    }
}

// ───────────────────────── Stage 4: Cleaned ──────────────────────────

/// Final pipeline state.
///
/// Call [`into_summary`](Self::into_summary) to release the collection
/// borrow and keep only the counts.
#[must_use = "call .into_summary() to obtain the run summary"]
pub struct Cleaned<'a> {
    lines: &'a mut LineFeatureCollection,
    group_count: usize,
    unmatched: usize,
    stats: AssignStats,
    removed: usize,
}

impl Cleaned<'_> {
    /// Number of non-finite coordinates removed.
    #[must_use]
    pub const fn removed(&self) -> usize {
        self.removed
    }

    /// The final collection.
    #[must_use]
    pub fn lines(&self) -> &LineFeatureCollection {
        self.lines
    }

    /// Summarize the run.
    #[must_use]
    pub fn into_summary(self) -> FanOutSummary {
        FanOutSummary {
            line_count: self.lines.len(),
            group_count: self.group_count,
            unmatched_directions: self.unmatched,
            offsets_applied: self.stats.offsets_applied,
            splice_misses: self.stats.splice_misses,
            removed_points: self.removed,
        }
    }
}

// ───────────────────────── Entry point ───────────────────────────────

/// Entry point for the staged pipeline.
///
/// Each stage method consumes the current state and returns the next,
/// making it a compile-time error to skip stages or call them out of
/// order.
pub struct Pipeline;

impl Pipeline {
    /// Start a pipeline over `lines`.
    ///
    /// No processing is performed and the config is not validated; use
    /// [`crate::fan_out`] for a checked one-shot run.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(lines: &mut LineFeatureCollection, config: OffsetConfig) -> Pending<'_> {
        Pending {
            lines,
            config,
            matcher: CoordMatcher::new(config.tolerance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LineFeature, Point};

    fn collection(lines: &[&[(f64, f64)]]) -> LineFeatureCollection {
        lines
            .iter()
            .map(|l| LineFeature::new(l.iter().map(|&(x, y)| Point::new(x, y)).collect()))
            .collect()
    }

    #[test]
    fn pending_exposes_lines_and_config() {
        let mut lines = collection(&[&[(0.0, 0.0), (1.0, 0.0)]]);
        let config = OffsetConfig {
            offset_step_m: 5.0,
            ..OffsetConfig::default()
        };
        let pending = Pipeline::new(&mut lines, config);
        assert_eq!(pending.lines().len(), 1);
        assert!((pending.config().offset_step_m - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn detect_reports_shared_segments() {
        let shared: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 0.0)];
        let mut lines = collection(&[shared, shared, &[(5.0, 5.0), (6.0, 6.0)]]);
        let detected = Pipeline::new(&mut lines, OffsetConfig::default()).detect();
        assert_eq!(detected.overlaps().len(), 1);
        assert_eq!(detected.overlaps()[0].members, vec![0, 1]);
        assert_eq!(detected.detect_stats().pairs_tested, 1);
    }

    #[test]
    fn reversed_lines_share_no_segment() {
        let mut lines = collection(&[&[(0.0, 0.0), (1.0, 0.0)], &[(1.0, 0.0), (0.0, 0.0)]]);
        let before = lines.clone();
        let pending = Pipeline::new(&mut lines, OffsetConfig::default());
        let classified = pending.detect().classify();
        // Reversed shared run: no forward common run is detected.
        assert!(classified.groups().is_empty());
        assert_eq!(classified.unmatched_directions(), 0);
        let summary = classified.apply_offsets().clean().into_summary();
        assert_eq!(summary.group_count, 0);
        assert_eq!(lines, before);
    }

    #[test]
    fn full_run_summarizes_counts() {
        let shared: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)];
        let mut lines = collection(&[shared, shared, shared]);
        let offset = Pipeline::new(&mut lines, OffsetConfig::default())
            .detect()
            .classify()
            .apply_offsets();
        assert_eq!(offset.stats().forward_members, 3);
        let cleaned = offset.clean();
        assert_eq!(cleaned.removed(), 0);
        let summary = cleaned.into_summary();
        assert_eq!(
            summary,
            FanOutSummary {
                line_count: 3,
                group_count: 1,
                unmatched_directions: 0,
                offsets_applied: 3,
                splice_misses: 0,
                removed_points: 0,
            }
        );
    }

    #[test]
    fn degenerate_shared_segment_is_cleaned() {
        // Consecutive duplicate coordinates form a zero-length shared
        // segment. It has no direction, so even the zero offset is NaN.
        let shared: &[(f64, f64)] = &[(1.0, 1.0), (1.0, 1.0)];
        let mut lines = collection(&[shared, shared]);
        let summary = Pipeline::new(&mut lines, OffsetConfig::default())
            .detect()
            .classify()
            .apply_offsets()
            .clean()
            .into_summary();
        assert_eq!(summary.offsets_applied, 2);
        assert_eq!(summary.removed_points, 4);
        assert!(lines.lines().iter().all(LineFeature::is_empty));
        assert_eq!(lines.len(), 2);
    }
}
