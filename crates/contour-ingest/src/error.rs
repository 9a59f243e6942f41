//! Error types for the ingest crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading contour files.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Feature {feature} has no numeric '{property}' property")]
    MissingElevation { feature: usize, property: String },

    #[error("Feature {feature} has unsupported geometry type '{kind}'")]
    UnsupportedGeometry { feature: usize, kind: String },

    #[error("Feature {feature} has malformed coordinates: {reason}")]
    MalformedCoordinates { feature: usize, reason: String },

    #[error("Point ({x}, {y}) lies outside the configured bounds")]
    OutOfBounds { x: f64, y: f64 },

    #[error("No contour lines found")]
    NoContours,
}

impl IngestError {
    pub fn malformed(feature: usize, reason: impl Into<String>) -> Self {
        Self::MalformedCoordinates {
            feature,
            reason: reason.into(),
        }
    }
}

/// Result type for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;
