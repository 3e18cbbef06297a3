//! GeoJSON `FeatureCollection` of `LineString` features.
//!
//! Only the subset the pipeline consumes is modelled: a feature collection
//! whose every feature carries a `LineString` geometry with 2-D positions.
//! Feature `id`, `properties`, and any foreign members (such as `bbox`) are
//! kept verbatim so a document can be read, fanned out, and written back
//! without losing attributes.
//!
//! Positions are `[longitude, latitude]`. Positions with an altitude, other
//! geometry types, and `null` geometries are rejected at parse time.

use linefan_pipeline::{LineFeature, LineFeatureCollection, Point};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ExportError;

/// The `"type": "FeatureCollection"` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum CollectionType {
    FeatureCollection,
}

/// The `"type": "Feature"` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum FeatureType {
    Feature,
}

/// A line geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// An ordered sequence of `[x, y]` positions.
    LineString {
        /// Positions in order of travel.
        coordinates: Vec<[f64; 2]>,
    },
}

impl Geometry {
    /// Positions of the geometry.
    #[must_use]
    pub fn coordinates(&self) -> &[[f64; 2]] {
        match self {
            Self::LineString { coordinates } => coordinates,
        }
    }
}

/// A single GeoJSON feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    kind: FeatureType,

    /// Optional feature identifier, string or number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// The feature's line geometry.
    pub geometry: Geometry,

    /// Feature attributes. Serialized as `null` when absent.
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,

    /// Any other members present on the feature object.
    #[serde(flatten)]
    pub foreign_members: Map<String, Value>,
}

impl Feature {
    /// A feature with the given positions and no id or properties.
    #[must_use]
    pub fn new(coordinates: Vec<[f64; 2]>) -> Self {
        Self {
            kind: FeatureType::Feature,
            id: None,
            geometry: Geometry::LineString { coordinates },
            properties: None,
            foreign_members: Map::new(),
        }
    }

    /// Convert the geometry to a pipeline line.
    #[must_use]
    pub fn to_line(&self) -> LineFeature {
        LineFeature::new(
            self.geometry
                .coordinates()
                .iter()
                .map(|&[x, y]| Point::new(x, y))
                .collect(),
        )
    }

    /// Replace the geometry's positions with the points of `line`.
    pub fn set_line(&mut self, line: &LineFeature) {
        self.geometry = Geometry::LineString {
            coordinates: line.points().iter().map(|p| [p.x, p.y]).collect(),
        };
    }
}

/// A GeoJSON `FeatureCollection` of line features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    kind: CollectionType,

    /// Features in document order.
    pub features: Vec<Feature>,

    /// Any other members present on the collection object.
    #[serde(flatten)]
    pub foreign_members: Map<String, Value>,
}

impl FeatureCollection {
    /// A collection holding `features`.
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: CollectionType::FeatureCollection,
            features,
            foreign_members: Map::new(),
        }
    }

    /// Pipeline lines, one per feature, at the same indices.
    #[must_use]
    pub fn to_lines(&self) -> LineFeatureCollection {
        self.features.iter().map(Feature::to_line).collect()
    }

    /// Overwrite every feature's positions with the matching line.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::FeatureCountMismatch`] if `lines` and the
    /// collection have different lengths. Nothing is written in that case.
    pub fn write_back(&mut self, lines: &LineFeatureCollection) -> Result<(), ExportError> {
        if lines.len() != self.features.len() {
            return Err(ExportError::FeatureCountMismatch {
                features: self.features.len(),
                lines: lines.len(),
            });
        }
        for (feature, line) in self.features.iter_mut().zip(lines.lines()) {
            feature.set_line(line);
        }
        Ok(())
    }

    /// Overwrite the features at `indices` with the matching lines.
    ///
    /// `lines[k]` is written into feature `indices[k]`; every other feature
    /// is left as it is. This is the inverse of [`select`](Self::select)
    /// followed by [`to_lines`](Self::to_lines).
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::FeatureCountMismatch`] if `indices` and `lines`
    /// have different lengths, or [`ExportError::FeatureIndexOutOfRange`] if
    /// an index names no feature. Nothing is written in either case.
    pub fn write_back_at(
        &mut self,
        indices: &[usize],
        lines: &LineFeatureCollection,
    ) -> Result<(), ExportError> {
        if lines.len() != indices.len() {
            return Err(ExportError::FeatureCountMismatch {
                features: indices.len(),
                lines: lines.len(),
            });
        }
        if let Some(&index) = indices.iter().find(|&&idx| idx >= self.features.len()) {
            return Err(ExportError::FeatureIndexOutOfRange {
                index,
                features: self.features.len(),
            });
        }
        for (&idx, line) in indices.iter().zip(lines.lines()) {
            self.features[idx].set_line(line);
        }
        Ok(())
    }

    /// Copy of the collection holding only the features at `indices`, in
    /// the order given. Out-of-range indices are skipped.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            kind: self.kind,
            features: indices
                .iter()
                .filter_map(|&idx| self.features.get(idx).cloned())
                .collect(),
            foreign_members: self.foreign_members.clone(),
        }
    }
}

/// Parse a GeoJSON document.
///
/// # Errors
///
/// Returns [`ExportError::Parse`] if the document is not a
/// `FeatureCollection` of 2-D `LineString` features.
pub fn from_geojson_str(input: &str) -> Result<FeatureCollection, ExportError> {
    serde_json::from_str(input).map_err(ExportError::Parse)
}

/// Serialize a collection as GeoJSON text.
///
/// # Errors
///
/// Returns [`ExportError::Serialize`] if serialization fails.
pub fn to_geojson_string(
    collection: &FeatureCollection,
    pretty: bool,
) -> Result<String, ExportError> {
    let result = if pretty {
        serde_json::to_string_pretty(collection)
    } else {
        serde_json::to_string(collection)
    };
    result.map_err(ExportError::Serialize)
}
