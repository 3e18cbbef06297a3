//! SVG preview serializer.
//!
//! Renders lines as `<path>` elements using the [`svg`] crate for document
//! construction, XML escaping, and path data formatting. Each line gets a
//! stroke color from [`LINE_COLORS`], cycling by line index, so neighbouring
//! strands of a fanned-out corridor are distinguishable.
//!
//! Coordinates are projected equirectangularly into a `viewBox` that is
//! [`DOCUMENT_WIDTH`] units wide, with the y-axis flipped so north is up.
//!
//! This is a pure function with no I/O: it returns a `String`.

use linefan_pipeline::{LineFeature, Point};
use svg::Document;
use svg::node::Text;
use svg::node::Value;
use svg::node::element::path::Data;
use svg::node::element::{Description, Path, Title};

/// Width of the `viewBox` in user units.
pub const DOCUMENT_WIDTH: f64 = 1000.0;

/// Padding around the drawing, in user units.
const PADDING: f64 = 10.0;

/// Stroke palette, indexed by line index modulo its length.
pub const LINE_COLORS: &[&str] = &[
    "#e6194b", // red
    "#3cb44b", // green
    "#4363d8", // blue
    "#f58231", // orange
    "#911eb4", // purple
    "#42d4f4", // cyan
    "#f032e6", // magenta
    "#9a6324", // brown
];

/// Metadata to embed in the SVG document.
///
/// Both fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted right after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,
}

/// Maps geographic coordinates into the `viewBox`.
#[derive(Debug, Clone, Copy)]
struct Projection {
    min_x: f64,
    max_y: f64,
    scale: f64,
    height: f64,
}

impl Projection {
    /// Fit the finite points of `lines` into [`DOCUMENT_WIDTH`].
    fn fit(lines: &[LineFeature]) -> Self {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in lines
            .iter()
            .flat_map(LineFeature::points)
            .filter(|p| p.is_finite())
        {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        if !min_x.is_finite() {
            return Self {
                min_x: 0.0,
                max_y: 0.0,
                scale: 1.0,
                height: DOCUMENT_WIDTH,
            };
        }

        let span = (max_x - min_x).max(max_y - min_y);
        let scale = if span > 0.0 {
            DOCUMENT_WIDTH / span
        } else {
            1.0
        };
        Self {
            min_x,
            max_y,
            scale,
            height: ((max_y - min_y) * scale).max(1.0),
        }
    }

    fn apply(self, p: Point) -> (f64, f64) {
        ((p.x - self.min_x) * self.scale, (self.max_y - p.y) * self.scale)
    }
}

/// Build the SVG path `d` attribute for `line` under `projection`.
///
/// Returns an empty string for lines with fewer than 2 points.
fn build_path_data(line: &LineFeature, projection: Projection) -> String {
    let points = line.points();
    if points.len() < 2 {
        return String::new();
    }

    let mut data = Data::new().move_to(projection.apply(points[0]));
    for &p in &points[1..] {
        data = data.line_to(projection.apply(p));
    }
    String::from(Value::from(data))
}

/// Serialize lines into an SVG preview document.
///
/// One `<path>` per line, in input order. Lines with fewer than two points
/// are skipped but still consume a palette slot, so a line keeps its color
/// regardless of which other lines are drawable.
#[must_use]
pub fn to_svg(lines: &[LineFeature], metadata: &SvgMetadata<'_>) -> String {
    let projection = Projection::fit(lines);
    let width = DOCUMENT_WIDTH + 2.0 * PADDING;
    let height = projection.height + 2.0 * PADDING;

    let mut doc = Document::new()
        .set("width", width)
        .set("height", height)
        .set(
            "viewBox",
            format!("{} {} {width} {height}", -PADDING, -PADDING),
        );

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    for (idx, line) in lines.iter().enumerate() {
        let d = build_path_data(line, projection);
        if d.is_empty() {
            continue;
        }

        let path = Path::new()
            .set("d", d)
            .set("fill", "none")
            .set("stroke", LINE_COLORS[idx % LINE_COLORS.len()])
            .set("stroke-width", 2)
            .set("stroke-linejoin", "round")
            .set("data-line", idx);
        doc = doc.add(path);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
