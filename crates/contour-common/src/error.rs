//! Error types for contour rasterization.

use thiserror::Error;

/// Result type alias using ContourError.
pub type ContourResult<T> = Result<T, ContourError>;

/// Primary error type for engine setup and rasterization passes.
///
/// Per-pixel "no data" outcomes are never reported through this type; they
/// are written to the output as a sentinel value.
#[derive(Debug, Error)]
pub enum ContourError {
    // === Configuration Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Raster size {0} is too small (minimum 2)")]
    SizeTooSmall(usize),

    #[error("No contour geometry loaded")]
    EmptyGeometry,

    #[error("Geometry was loaded at {loaded} precision but the configuration requests {requested}")]
    PrecisionMismatch { loaded: String, requested: String },

    // === Pass Errors ===
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Output buffer holds {actual} values, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ContourError {
    /// Create an InvalidConfig error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an InvalidRegion error.
    pub fn region(msg: impl Into<String>) -> Self {
        Self::InvalidRegion(msg.into())
    }

    /// Whether this error was caused by how the engine was configured, as
    /// opposed to a bad per-pass argument or an I/O failure.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ContourError::InvalidConfig(_)
                | ContourError::SizeTooSmall(_)
                | ContourError::EmptyGeometry
                | ContourError::PrecisionMismatch { .. }
        )
    }
}
