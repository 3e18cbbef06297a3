//! Pipeline diagnostics: timing and counts for each stage.
//!
//! Durations are measured through an injected [`Clock`] so this crate never
//! reads the system time itself. Callers on native targets typically wrap
//! `std::time::Instant`.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;
use crate::types::{FanOutSummary, LineFeatureCollection, OffsetConfig, PipelineError};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// Current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanOutDiagnostics {
    /// Stage 1: overlap detection.
    pub detect: StageDiagnostics,
    /// Stage 2: direction classification.
    pub classify: StageDiagnostics,
    /// Stage 3: offset assignment and splicing.
    pub assign: StageDiagnostics,
    /// Stage 4: non-finite coordinate cleanup.
    pub clean: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts for the run.
    pub summary: FanOutSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Overlap detection metrics.
    Detect {
        /// Number of input lines.
        line_count: usize,
        /// Total coordinates across all lines.
        point_count: usize,
        /// Line pairs whose coordinates were compared.
        pairs_tested: usize,
        /// Line pairs skipped by envelope pruning.
        pairs_pruned: usize,
        /// Common runs found before merging.
        runs_found: usize,
        /// Distinct shared segments after merging.
        segment_count: usize,
    },
    /// Direction classification metrics.
    Classify {
        /// Number of overlap groups.
        group_count: usize,
        /// Members across all groups.
        member_count: usize,
        /// Members whose direction could not be resolved.
        unmatched: usize,
    },
    /// Offset assignment metrics.
    Assign {
        /// Coordinate equality tolerance in effect.
        tolerance: f64,
        /// Lateral step in meters.
        offset_step_m: f64,
        /// Members processed as forward.
        forward_members: usize,
        /// Members processed as backward.
        backward_members: usize,
        /// Replacements written into a line.
        offsets_applied: usize,
        /// Replacements whose target run was not found.
        splice_misses: usize,
    },
    /// Cleanup metrics.
    Clean {
        /// Total coordinates before cleanup.
        points_before: usize,
        /// Total coordinates after cleanup.
        points_after: usize,
    },
}

impl FanOutDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Fan-out Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!("Lines: {}", self.summary.line_count));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Detect", &self.detect),
            ("Classify", &self.classify),
            ("Assign", &self.assign),
            ("Clean", &self.clean),
        ];

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Groups: {}  |  Offsets applied: {}  |  Splice misses: {}  |  Removed points: {}",
            self.summary.group_count,
            self.summary.offsets_applied,
            self.summary.splice_misses,
            self.summary.removed_points,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Detect {
            line_count,
            point_count,
            pairs_tested,
            pairs_pruned,
            runs_found,
            segment_count,
        } => format!(
            "{line_count} lines, {point_count} pts, pairs={pairs_tested} (pruned {pairs_pruned}), runs={runs_found} -> {segment_count} segments",
        ),
        StageMetrics::Classify {
            group_count,
            member_count,
            unmatched,
        } => format!("{group_count} groups, {member_count} members, {unmatched} unmatched"),
        StageMetrics::Assign {
            tolerance,
            offset_step_m,
            forward_members,
            backward_members,
            offsets_applied,
            splice_misses,
        } => format!(
            "step={offset_step_m:.2}m tol={tolerance:e} fwd={forward_members} bwd={backward_members} applied={offsets_applied} misses={splice_misses}",
        ),
        StageMetrics::Clean {
            points_before,
            points_after,
        } => format!("{points_before}->{points_after} pts"),
    }
}

/// Run the full pipeline like [`crate::fan_out`], timing every stage.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails
/// [`OffsetConfig::validate`]. The collection is untouched in that case.
pub fn fan_out_with_diagnostics<C: Clock>(
    lines: &mut LineFeatureCollection,
    config: &OffsetConfig,
    clock: &C,
) -> Result<FanOutDiagnostics, PipelineError> {
    config.validate()?;
    let start = clock.now();

    let line_count = lines.len();
    let point_count = lines.total_points();

    let t = clock.now();
    let detected = Pipeline::new(lines, *config).detect();
    let detect_stats = detected.detect_stats();
    let detect = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Detect {
            line_count,
            point_count,
            pairs_tested: detect_stats.pairs_tested,
            pairs_pruned: detect_stats.pairs_pruned,
            runs_found: detect_stats.runs_found,
            segment_count: detected.overlaps().len(),
        },
    };

    let t = clock.now();
    let classified = detected.classify();
    let classify = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Classify {
            group_count: classified.groups().len(),
            member_count: classified.groups().iter().map(|g| g.members().len()).sum(),
            unmatched: classified.unmatched_directions(),
        },
    };

    let t = clock.now();
    let offset = classified.apply_offsets();
    let stats = offset.stats();
    let assign = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Assign {
            tolerance: config.tolerance,
            offset_step_m: config.offset_step_m,
            forward_members: stats.forward_members,
            backward_members: stats.backward_members,
            offsets_applied: stats.offsets_applied,
            splice_misses: stats.splice_misses,
        },
    };

    let points_before = offset.lines().total_points();
    let t = clock.now();
    let cleaned = offset.clean();
    let clean = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Clean {
            points_before,
            points_after: cleaned.lines().total_points(),
        },
    };

    let summary = cleaned.into_summary();
    Ok(FanOutDiagnostics {
        detect,
        classify,
        assign,
        clean,
        total_duration: clock.elapsed(&start),
        summary,
    })
}
