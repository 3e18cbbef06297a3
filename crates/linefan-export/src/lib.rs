//! linefan-export: Pure format adapters (sans-IO)
//!
//! Reads and writes GeoJSON line collections and renders SVG previews.
//! Every function works on in-memory strings; file handling lives in the
//! `linefan` CLI.

pub mod geojson;
pub mod svg;

pub use geojson::{
    Feature, FeatureCollection, Geometry, from_geojson_str, to_geojson_string,
};
pub use svg::{SvgMetadata, to_svg};

/// Errors from reading or writing an export format.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The input is not a GeoJSON `FeatureCollection` of `LineString`s.
    #[error("invalid GeoJSON line collection: {0}")]
    Parse(#[source] serde_json::Error),

    /// Serialization to GeoJSON text failed.
    #[error("failed to serialize GeoJSON: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A line collection does not line up with the features it is written
    /// back into.
    #[error("cannot write {lines} lines back into {features} features")]
    FeatureCountMismatch {
        /// Number of features in the collection.
        features: usize,
        /// Number of lines supplied.
        lines: usize,
    },

    /// A write-back index names no feature of the collection.
    #[error("feature index {index} is out of range for {features} features")]
    FeatureIndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of features in the collection.
        features: usize,
    },
}
