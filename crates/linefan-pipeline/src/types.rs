//! Shared types for the linefan overlap pipeline.

use serde::{Deserialize, Serialize};

/// A 2D coordinate.
///
/// For geographic input `x` is longitude and `y` is latitude, both in
/// degrees. The pipeline never reprojects; offsets are converted from
/// meters to degrees at the equatorial scale (see [`crate::offset`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (longitude).
    pub x: f64,
    /// Vertical position (latitude).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` if both components are finite (not NaN, not infinite).
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Point> for geo::Coord<f64> {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<geo::Coord<f64>> for Point {
    fn from(c: geo::Coord<f64>) -> Self {
        Self::new(c.x, c.y)
    }
}

/// An ordered polyline representing one transit path.
///
/// The feature's index inside its [`LineFeatureCollection`] is its only
/// identity during a pipeline run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineFeature(Vec<Point>);

impl LineFeature {
    /// Create a new line from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the line has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the line.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Mutable access to the points.
    ///
    /// Hands out a slice rather than the vector so callers can overwrite
    /// coordinates but cannot change the point count.
    #[must_use]
    pub fn points_mut(&mut self) -> &mut [Point] {
        &mut self.0
    }

    /// Keep only the points for which `keep` returns `true`.
    pub fn retain_points(&mut self, keep: impl FnMut(&Point) -> bool) {
        self.0.retain(keep);
    }
}

impl From<Vec<Point>> for LineFeature {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

/// An ordered collection of lines, transformed in place by the pipeline.
///
/// Indices `0..len()` are run-local identifiers. They are stable for the
/// duration of one [`fan_out`](crate::fan_out) call and carry no meaning
/// outside it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineFeatureCollection(Vec<LineFeature>);

impl LineFeatureCollection {
    /// Create a collection from a vector of lines.
    #[must_use]
    pub const fn new(lines: Vec<LineFeature>) -> Self {
        Self(lines)
    }

    /// Returns `true` if the collection holds no lines.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of lines in the collection.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// The line at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LineFeature> {
        self.0.get(index)
    }

    /// Mutable access to the line at `index`, if any.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut LineFeature> {
        self.0.get_mut(index)
    }

    /// Returns a slice of all lines.
    #[must_use]
    pub fn lines(&self) -> &[LineFeature] {
        &self.0
    }

    /// Iterate mutably over the lines without allowing insertion or removal.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, LineFeature> {
        self.0.iter_mut()
    }

    /// Total number of points across all lines.
    #[must_use]
    pub fn total_points(&self) -> usize {
        self.0.iter().map(LineFeature::len).sum()
    }
}

impl FromIterator<LineFeature> for LineFeatureCollection {
    fn from_iter<I: IntoIterator<Item = LineFeature>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// How a line traverses a shared segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// The line visits the segment's coordinates in the segment's own order.
    Forward,
    /// The line visits the segment's coordinates in reverse order.
    Backward,
}

/// Configuration for the overlap offset pipeline.
///
/// Use [`validate`](Self::validate) (or [`crate::fan_out`], which calls it)
/// before running the pipeline with values from an untrusted source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetConfig {
    /// Lateral distance in meters between adjacent lines of the same
    /// direction group. The `n`th member of a direction group (counting
    /// from zero) is shifted by `n * offset_step_m`.
    pub offset_step_m: f64,

    /// Per-axis coordinate equality tolerance, in coordinate units.
    ///
    /// `0.0` means exact numeric equality. Larger values let coordinates
    /// that drifted through reprojection or rounding still count as shared.
    pub tolerance: f64,
}

impl OffsetConfig {
    /// Default lateral step between adjacent lines, in meters.
    pub const DEFAULT_OFFSET_STEP_M: f64 = 3.0;

    /// Default coordinate equality tolerance (exact match).
    pub const DEFAULT_TOLERANCE: f64 = 0.0;

    /// Check that every field holds a usable value.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `offset_step_m` or
    /// `tolerance` is negative or not finite.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.offset_step_m.is_finite() || self.offset_step_m < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "offset_step_m must be finite and non-negative, got {}",
                self.offset_step_m
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self {
            offset_step_m: Self::DEFAULT_OFFSET_STEP_M,
            tolerance: Self::DEFAULT_TOLERANCE,
        }
    }
}

/// Counts describing what one pipeline run did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FanOutSummary {
    /// Number of lines in the collection.
    pub line_count: usize,
    /// Number of distinct shared segments found.
    pub group_count: usize,
    /// Members whose direction could not be resolved (skipped).
    pub unmatched_directions: usize,
    /// Offset replacements written back into a line.
    pub offsets_applied: usize,
    /// Offset replacements whose target run was not found in the line.
    pub splice_misses: usize,
    /// Non-finite coordinates removed by the final cleanup.
    pub removed_points: usize,
}

/// Errors surfaced by the pipeline.
///
/// Geometry problems never produce an error; they degrade to no-ops and
/// show up as counts in [`FanOutSummary`]. Only configuration is checked.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
