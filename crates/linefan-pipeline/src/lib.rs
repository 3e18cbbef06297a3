//! linefan-pipeline: lateral offsetting of overlapping transit lines
//! (sans-IO).
//!
//! Where several lines share the same run of coordinates, drawing them as
//! given stacks them on top of each other. This crate fans them out into
//! side-by-side parallel strands:
//!
//! detect shared segments -> classify member directions ->
//! offset and splice -> drop non-finite coordinates.
//!
//! Lines travelling the same way along a shared segment are spaced
//! [`OffsetConfig::offset_step_m`] apart, with the first one left in place.
//! Lines travelling the opposite way spread to the other side.
//!
//! This crate has **no I/O dependencies**. It operates on an in-memory
//! [`LineFeatureCollection`] which it rewrites in place. GeoJSON parsing
//! and SVG rendering live in `linefan-export`.

pub mod assign;
pub mod classify;
pub mod clean;
pub mod detect;
pub mod diagnostics;
pub mod key;
pub mod offset;
pub mod pipeline;
pub mod splice;
pub mod types;
pub mod viewport;

pub use classify::OverlapGroup;
pub use detect::{Overlap, SharedSegment};
pub use key::CoordMatcher;
pub use pipeline::Pipeline;
pub use types::{
    Direction, FanOutSummary, LineFeature, LineFeatureCollection, OffsetConfig, PipelineError,
    Point,
};

/// Offset every overlapping line in `lines`, in place.
///
/// # Pipeline steps
///
/// 1. Find every run of two or more coordinates shared by two or more lines
/// 2. Classify each member as forward or backward along the shared run
/// 3. Offset each member by its rank within its direction and splice the
///    result back into the line
/// 4. Remove non-finite coordinates
///
/// Line count and order never change. Lines that share nothing are left
/// untouched.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails
/// [`OffsetConfig::validate`]. The collection is untouched in that case.
pub fn fan_out(
    lines: &mut LineFeatureCollection,
    config: &OffsetConfig,
) -> Result<FanOutSummary, PipelineError> {
    config.validate()?;
    let summary = Pipeline::new(lines, *config)
        .detect()
        .classify()
        .apply_offsets()
        .clean()
        .into_summary();
    tracing::debug!(
        lines = summary.line_count,
        groups = summary.group_count,
        applied = summary.offsets_applied,
        "fan-out finished"
    );
    Ok(summary)
}
