//! Source-unit extent used to normalize contours into the unit square.

use serde::{Deserialize, Serialize};

/// Combined extent of all loaded coordinates and elevations, in source units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub min_elevation: f64,
    pub max_elevation: f64,
}

impl Default for SourceBounds {
    fn default() -> Self {
        Self::empty()
    }
}

/// Map `v` from `[min, max]` onto `[0, 1]`; a degenerate range maps to 0.
#[inline]
fn unit(v: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span > 0.0 {
        (v - min) / span
    } else {
        0.0
    }
}

impl SourceBounds {
    /// Bounds that contain nothing; every `include` widens them.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
            min_elevation: f64::INFINITY,
            max_elevation: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn include_point(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn include_elevation(&mut self, elevation: f64) {
        self.min_elevation = self.min_elevation.min(elevation);
        self.max_elevation = self.max_elevation.max(elevation);
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Source coordinate to normalized `[0, 1]` coordinate.
    #[inline]
    pub fn normalize_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            unit(x, self.min_x, self.max_x),
            unit(y, self.min_y, self.max_y),
        )
    }

    #[inline]
    pub fn normalize_elevation(&self, elevation: f64) -> f64 {
        unit(elevation, self.min_elevation, self.max_elevation)
    }

    /// Normalized elevation back to source units.
    pub fn denormalize_elevation(&self, normalized: f64) -> f64 {
        self.min_elevation + normalized * (self.max_elevation - self.min_elevation)
    }

    /// Normalized coordinate back to source units.
    pub fn denormalize_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.min_x + x * self.width(),
            self.min_y + y * self.height(),
        )
    }
}
