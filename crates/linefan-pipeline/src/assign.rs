//! Offset assignment: fan out the members of each overlap group.
//!
//! Within a group, members are split by direction and each direction keeps
//! its own counter. The `n`th member of a direction (counting from zero)
//! receives a parallel copy of the segment shifted by `n * offset_step_m`,
//! so the first forward member and the first backward member both stay on
//! the original alignment.
//!
//! Backward members offset the *reversed* segment. Since a positive offset
//! moves to the right of travel, the two directions spread to opposite
//! sides of the shared street.
//!
//! Groups are processed in first-found order and each replacement is
//! spliced into its line immediately. A later group whose coordinates were
//! already moved by an earlier one simply misses; that is expected and is
//! counted rather than reported as an error.

use tracing::{debug, trace};

use crate::classify::OverlapGroup;
use crate::key::CoordMatcher;
use crate::offset::line_offset;
use crate::splice::replace_segment;
use crate::types::{Direction, LineFeatureCollection, OffsetConfig};

/// Counts from one offset pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssignStats {
    /// Members processed as forward.
    pub forward_members: usize,
    /// Members processed as backward.
    pub backward_members: usize,
    /// Replacements written into a line.
    pub offsets_applied: usize,
    /// Replacements whose target run was not found.
    pub splice_misses: usize,
}

/// Apply lateral offsets for every group to `lines`, in place.
pub fn apply_offsets(
    groups: &[OverlapGroup],
    lines: &mut LineFeatureCollection,
    config: &OffsetConfig,
    matcher: &CoordMatcher,
) -> AssignStats {
    let mut stats = AssignStats::default();

    for group in groups {
        let segment = group.segment().points();
        let reversed: Vec<_> = segment.iter().rev().copied().collect();
        let mut forward_count: u32 = 0;
        let mut backward_count: u32 = 0;

        for (line_idx, direction) in group.pairs() {
            let (base, rank) = match direction {
                Direction::Forward => {
                    stats.forward_members += 1;
                    let rank = forward_count;
                    forward_count += 1;
                    (segment, rank)
                }
                Direction::Backward => {
                    stats.backward_members += 1;
                    let rank = backward_count;
                    backward_count += 1;
                    (reversed.as_slice(), rank)
                }
            };

            let distance = config.offset_step_m * f64::from(rank);
            let replacement = line_offset(base, distance);

            let spliced = lines
                .get_mut(line_idx)
                .is_some_and(|line| replace_segment(line, base, &replacement, matcher));
            if spliced {
                stats.offsets_applied += 1;
            } else {
                stats.splice_misses += 1;
            }
            trace!(
                segment = group.segment().key().fingerprint(),
                line = line_idx,
                ?direction,
                distance_m = distance,
                spliced,
                "offset member"
            );
        }
    }

    debug!(
        groups = groups.len(),
        applied = stats.offsets_applied,
        misses = stats.splice_misses,
        "offset assignment finished"
    );

    stats
}
