//! Raster engine configuration.

use crate::error::{ContourError, ContourResult};
use serde::{Deserialize, Serialize};

/// Default output resolution (and grid resolution) per axis.
pub const DEFAULT_SIZE: usize = 1000;

/// Largest accepted `size`. Index and output buffers hold `size * size`
/// entries, so this keeps that product addressable on every target.
pub const MAX_SIZE: usize = 16_384;

/// Ring cap for the nearest-segment search.
pub const DEFAULT_MAX_RINGS: usize = 90;

/// Angular sectors used by the elevation interpolator. Must be even.
pub const DEFAULT_SECTOR_COUNT: usize = 10;

/// Upper bound on `sector_count`; sector state lives in a fixed array.
pub const MAX_SECTOR_COUNT: usize = 64;

/// Squared distance below which a query is considered on the line.
pub const DEFAULT_ON_LINE_EPSILON: f64 = 1e-12;

/// Configuration for a rasterization engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Output raster size per axis; also the spatial index grid size.
    pub size: usize,

    /// Point precision of the loaded geometry.
    pub precision: Precision,

    /// Worker threads per pass. `None` picks one less than the available
    /// hardware parallelism (at least one).
    pub workers: Option<usize>,

    /// Hard cap on search rings per query.
    pub max_rings: usize,

    /// Number of angular sectors that must be filled before a search stops.
    pub sector_count: usize,

    /// Squared distance treated as "on the line".
    pub on_line_epsilon: f64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            precision: Precision::High,
            workers: None,
            max_rings: DEFAULT_MAX_RINGS,
            sector_count: DEFAULT_SECTOR_COUNT,
            on_line_epsilon: DEFAULT_ON_LINE_EPSILON,
        }
    }
}

impl RasterConfig {
    /// Default configuration at the given size.
    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CONTOUR_RASTER_SIZE") {
            if let Ok(size) = val.parse() {
                config.size = size;
            }
        }

        if let Ok(val) = std::env::var("CONTOUR_PRECISION") {
            config.precision = Precision::from_str(&val);
        }

        if let Ok(val) = std::env::var("CONTOUR_WORKERS") {
            if let Ok(workers) = val.parse::<usize>() {
                config.workers = Some(workers).filter(|w| *w > 0);
            }
        }

        if let Ok(val) = std::env::var("CONTOUR_MAX_RINGS") {
            if let Ok(rings) = val.parse() {
                config.max_rings = rings;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ContourResult<()> {
        if self.size < 2 {
            return Err(ContourError::SizeTooSmall(self.size));
        }

        if self.size > MAX_SIZE || self.size.checked_mul(self.size).is_none() {
            return Err(ContourError::config(format!(
                "size must be at most {}, got {}",
                MAX_SIZE, self.size
            )));
        }

        if self.sector_count < 2
            || self.sector_count % 2 != 0
            || self.sector_count > MAX_SECTOR_COUNT
        {
            return Err(ContourError::config(format!(
                "sector_count must be even and within 2..={}, got {}",
                MAX_SECTOR_COUNT, self.sector_count
            )));
        }

        if self.max_rings == 0 {
            return Err(ContourError::config("max_rings must be > 0"));
        }

        if self.workers == Some(0) {
            return Err(ContourError::config("workers must be > 0"));
        }

        if !(self.on_line_epsilon >= 0.0) {
            return Err(ContourError::config("on_line_epsilon must be >= 0"));
        }

        Ok(())
    }

    /// Resolved worker count for a pass.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(default_worker_count).max(1)
    }

    /// Number of pixels in one output buffer.
    pub fn pixel_count(&self) -> usize {
        self.size * self.size
    }
}

/// `max(hardware concurrency - 1, 1)`, leaving one core to the caller.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Point storage precision, selected once per loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// 64-bit coordinates.
    High,
    /// 32-bit coordinates, for large geometry sets on small machines.
    Low,
}

impl Default for Precision {
    fn default() -> Self {
        Self::High
    }
}

impl Precision {
    /// Parse from string (case-insensitive). Unknown values fall back to high.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "low" | "f32" | "single" => Self::Low,
            _ => Self::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RasterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_rings, 90);
        assert_eq!(config.sector_count, 10);
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_validate_rejects_small_size() {
        let config = RasterConfig::with_size(1);
        assert!(matches!(config.validate(), Err(ContourError::SizeTooSmall(1))));
    }

    #[test]
    fn test_validate_rejects_oversized_grid() {
        assert!(RasterConfig::with_size(MAX_SIZE).validate().is_ok());

        let err = RasterConfig::with_size(MAX_SIZE + 1).validate().unwrap_err();
        assert!(matches!(err, ContourError::InvalidConfig(_)));
        assert!(err.is_configuration());

        // size * size would overflow usize.
        let err = RasterConfig::with_size(usize::MAX / 2).validate().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_validate_rejects_odd_sectors() {
        let config = RasterConfig {
            sector_count: 7,
            ..RasterConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RasterConfig {
            sector_count: MAX_SECTOR_COUNT + 2,
            ..RasterConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = RasterConfig {
            workers: Some(0),
            ..RasterConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_precision_parsing() {
        assert_eq!(Precision::from_str("LOW"), Precision::Low);
        assert_eq!(Precision::from_str("high"), Precision::High);
        assert_eq!(Precision::from_str("garbage"), Precision::High);
        assert_eq!(Precision::Low.to_string(), "low");
    }

    #[test]
    fn test_config_serde() {
        let config = RasterConfig {
            precision: Precision::Low,
            workers: Some(3),
            ..RasterConfig::with_size(256)
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"precision\":\"low\""));
        let parsed: RasterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
