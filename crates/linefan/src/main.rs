//! linefan: fan out overlapping transit lines in a GeoJSON file.
//!
//! Reads a `FeatureCollection` of `LineString` routes, offsets the routes
//! that share street segments so they render side by side, and writes the
//! collection back out with every feature's `id` and `properties` intact.
//! Per-stage diagnostics are printed to stderr.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin linefan -- [OPTIONS] <INPUT>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use linefan_export::{FeatureCollection, SvgMetadata};
use linefan_pipeline::OffsetConfig;
use linefan_pipeline::diagnostics::{Clock, FanOutDiagnostics, fan_out_with_diagnostics};
use linefan_pipeline::viewport::{bounds_polygon, lines_in_view};
use tracing::info;

/// Offset overlapping transit lines so shared corridors stay readable.
///
/// Lines running the same way along a shared segment are spaced
/// `--offset-step` meters apart; lines running the other way spread to the
/// opposite side.
#[derive(Parser)]
#[command(name = "linefan", version)]
struct Cli {
    /// Path to the input GeoJSON `FeatureCollection`.
    input: PathBuf,

    /// Only fan out lines with a vertex inside `min_x,min_y,max_x,max_y`.
    ///
    /// Lines outside the viewport are written out unchanged.
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    bbox: Option<BoundingBox>,

    /// Lateral distance between adjacent lines, in meters.
    #[arg(long, default_value_t = OffsetConfig::DEFAULT_OFFSET_STEP_M)]
    offset_step: f64,

    /// Coordinate equality tolerance (0 means exact).
    #[arg(long, default_value_t = OffsetConfig::DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Full offset config as a JSON string.
    ///
    /// When provided, `--offset-step` and `--tolerance` are ignored.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the GeoJSON result to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Indent the GeoJSON output.
    #[arg(long)]
    pretty: bool,

    /// Write an SVG preview of the result to this file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Print diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (repeatable). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Viewport corners in input coordinate units.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BoundingBox {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

/// Parse `min_x,min_y,max_x,max_y`.
fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    let values = s
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid bbox number: {e}"))?;
    let [min_x, min_y, max_x, max_y] = values[..] else {
        return Err(format!(
            "bbox needs 4 comma-separated numbers, got {}",
            values.len()
        ));
    };
    if values.iter().any(|v| !v.is_finite()) {
        return Err("bbox values must be finite".to_string());
    }
    Ok(BoundingBox {
        min_x,
        min_y,
        max_x,
        max_y,
    })
}

/// Build an [`OffsetConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored. Missing JSON fields take their
/// defaults.
fn config_from_cli(cli: &Cli) -> Result<OffsetConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(OffsetConfig {
        offset_step_m: cli.offset_step,
        tolerance: cli.tolerance,
    })
}

/// Indices of the features visible in `bbox`, or of every feature when no
/// viewport is given.
fn visible_indices(collection: &FeatureCollection, bbox: Option<BoundingBox>) -> Vec<usize> {
    let Some(bbox) = bbox else {
        return (0..collection.features.len()).collect();
    };
    let view = bounds_polygon(bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y);
    let visible = lines_in_view(&view, &collection.to_lines());
    info!(
        total = collection.features.len(),
        visible = visible.len(),
        "applied viewport filter"
    );
    visible
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let input = match std::fs::read_to_string(&cli.input) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    let mut collection = match linefan_export::from_geojson_str(&input) {
        Ok(fc) => fc,
        Err(e) => {
            eprintln!("Error in {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };
    info!(
        input = %cli.input.display(),
        features = collection.features.len(),
        "loaded GeoJSON"
    );

    let visible = visible_indices(&collection, cli.bbox);
    let mut lines = collection.select(&visible).to_lines();

    let diagnostics = match fan_out_with_diagnostics(&mut lines, &config, &StdClock) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = collection.write_back_at(&visible, &lines) {
        eprintln!("Error writing results: {e}");
        return ExitCode::FAILURE;
    }

    let geojson = match linefan_export::to_geojson_string(&collection, cli.pretty) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref output) = cli.output {
        if let Err(e) = std::fs::write(output, &geojson) {
            eprintln!("Error writing {}: {e}", output.display());
            return ExitCode::FAILURE;
        }
        eprintln!(
            "GeoJSON written to {} ({} bytes)",
            output.display(),
            geojson.len()
        );
    } else {
        println!("{geojson}");
    }

    if let Some(ref svg_path) = cli.svg {
        let title = cli
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("linefan");
        let desc = format!("{config:?}");
        let metadata = SvgMetadata {
            title: Some(title),
            description: Some(&desc),
        };
        let svg = linefan_export::to_svg(collection.to_lines().lines(), &metadata);
        match std::fs::write(svg_path, &svg) {
            Ok(()) => {
                eprintln!(
                    "SVG written to {} ({} bytes)",
                    svg_path.display(),
                    svg.len()
                );
            }
            Err(e) => {
                eprintln!("Error writing SVG to {}: {e}", svg_path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    print_diagnostics(&diagnostics, cli.json)
}

/// Print diagnostics to stderr.
fn print_diagnostics(diagnostics: &FanOutDiagnostics, json: bool) -> ExitCode {
    if json {
        match serde_json::to_string_pretty(diagnostics) {
            Ok(text) => eprintln!("{text}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        eprintln!("{}", diagnostics.report());
    }
    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bbox_parses_four_numbers() {
        assert_eq!(
            parse_bbox("-1.5, 2,3,4.25").unwrap(),
            BoundingBox {
                min_x: -1.5,
                min_y: 2.0,
                max_x: 3.0,
                max_y: 4.25,
            }
        );
    }

    #[test]
    fn bbox_rejects_wrong_arity_and_garbage() {
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("1,2,3,4,5").is_err());
        assert!(parse_bbox("1,2,x,4").is_err());
        assert!(parse_bbox("1,2,inf,4").is_err());
    }

    #[test]
    fn flags_build_config() {
        let cli = Cli::try_parse_from([
            "linefan",
            "in.geojson",
            "--offset-step",
            "5",
            "--tolerance",
            "1e-7",
        ])
        .unwrap();
        let config = config_from_cli(&cli).unwrap();
        assert!((config.offset_step_m - 5.0).abs() < f64::EPSILON);
        assert!((config.tolerance - 1e-7).abs() < f64::EPSILON);
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = Cli::try_parse_from([
            "linefan",
            "in.geojson",
            "--offset-step",
            "5",
            "--config-json",
            r#"{"offset_step_m": 8.0}"#,
        ])
        .unwrap();
        let config = config_from_cli(&cli).unwrap();
        assert!((config.offset_step_m - 8.0).abs() < f64::EPSILON);
        assert!(config.tolerance.abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_config_json_is_an_error() {
        let cli =
            Cli::try_parse_from(["linefan", "in.geojson", "--config-json", "{"]).unwrap();
        assert!(config_from_cli(&cli).is_err());
    }

    #[test]
    fn negative_bbox_is_accepted_as_a_value() {
        let cli = Cli::try_parse_from(["linefan", "in.geojson", "--bbox", "-10,-5,10,5"]).unwrap();
        assert_eq!(cli.bbox.map(|b| b.min_x), Some(-10.0));
    }

    #[test]
    fn viewport_picks_visible_features() {
        let fc = linefan_export::from_geojson_str(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0.5, 0.5], [2.0, 2.0]]}, "properties": null},
                {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[5.0, 5.0], [6.0, 6.0]]}, "properties": null}
            ]}"#,
        )
        .unwrap();
        let bbox = BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 1.0,
            max_y: 1.0,
        };
        assert_eq!(visible_indices(&fc, None), vec![0, 1]);
        assert_eq!(visible_indices(&fc, Some(bbox)), vec![0]);
    }

    #[test]
    fn lines_outside_viewport_survive_write_back() {
        let mut fc = linefan_export::from_geojson_str(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "id": "a", "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.5, 0.0], [1.0, 0.0]]}, "properties": null},
                {"type": "Feature", "id": "far", "geometry": {"type": "LineString", "coordinates": [[50.0, 50.0], [51.0, 50.0]]}, "properties": null},
                {"type": "Feature", "id": "b", "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.5, 0.0], [1.0, 0.0]]}, "properties": null}
            ]}"#,
        )
        .unwrap();
        let bbox = BoundingBox {
            min_x: -1.0,
            min_y: -1.0,
            max_x: 2.0,
            max_y: 1.0,
        };
        let visible = visible_indices(&fc, Some(bbox));
        assert_eq!(visible, vec![0, 2]);

        let mut lines = fc.select(&visible).to_lines();
        let summary = linefan_pipeline::fan_out(&mut lines, &OffsetConfig::default()).unwrap();
        assert_eq!(summary.group_count, 1);
        fc.write_back_at(&visible, &lines).unwrap();

        assert_eq!(fc.features.len(), 3);
        assert_eq!(
            fc.features[1].geometry.coordinates(),
            &[[50.0, 50.0], [51.0, 50.0]]
        );
        assert_eq!(fc.features[0].geometry.coordinates()[1], [0.5, 0.0]);
        assert!(fc.features[2].geometry.coordinates()[1][1] < 0.0);
    }
}
