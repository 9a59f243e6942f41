//! Square sub-regions of the normalized coordinate space.

use crate::error::{ContourError, ContourResult};
use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A square view `[left, left + size] x [top, top + size]` in normalized
/// coordinates. A raster of `n x n` pixels samples it linearly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub left: f64,
    pub top: f64,
    pub size: f64,
}

impl Region {
    /// Create a validated region.
    pub fn new(left: f64, top: f64, size: f64) -> ContourResult<Self> {
        let region = Self { left, top, size };
        region.validate()?;
        Ok(region)
    }

    /// The whole `[0,1] x [0,1]` space.
    pub fn full() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            size: 1.0,
        }
    }

    pub fn validate(&self) -> ContourResult<()> {
        if !(self.left.is_finite() && self.top.is_finite() && self.size.is_finite()) {
            return Err(ContourError::region(format!("non-finite region {:?}", self)));
        }
        if self.size <= 0.0 {
            return Err(ContourError::region(format!(
                "effective size must be > 0, got {}",
                self.size
            )));
        }
        Ok(())
    }

    /// Normalized coordinate sampled by pixel `(col, row)` of a
    /// `raster_size x raster_size` raster.
    #[inline]
    pub fn pixel_to_point(&self, col: usize, row: usize, raster_size: usize) -> Point {
        let n = raster_size as f64;
        Point::new(
            self.left + (col as f64 / n) * self.size,
            self.top + (row as f64 / n) * self.size,
        )
    }

    /// Width of one pixel in normalized units.
    #[inline]
    pub fn pixel_size(&self, raster_size: usize) -> f64 {
        self.size / raster_size as f64
    }

    /// Tile `(x, y)` of a `count x count` subdivision of this region.
    pub fn tile(&self, x: usize, y: usize, count: usize) -> Self {
        let view = self.size / count.max(1) as f64;
        Self {
            left: self.left + x as f64 * view,
            top: self.top + y as f64 * view,
            size: view,
        }
    }

    /// All tiles of a `count x count` subdivision, row by row.
    pub fn tiles(&self, count: usize) -> impl Iterator<Item = (usize, usize, Region)> + '_ {
        (0..count).flat_map(move |y| (0..count).map(move |x| (x, y, self.tile(x, y, count))))
    }

    /// Grow the view threefold around its origin, clamped to the unit square.
    pub fn zoom_out(&self) -> Self {
        let mut top = (self.top - self.size * 0.5).max(0.0);
        let mut left = (self.left - self.size * 0.5).max(0.0);
        let mut size = self.size * 3.0;

        if top + size > 1.0 {
            size = 1.0 - top;
        }
        if left + size > 1.0 {
            size = 1.0 - left;
        }
        if size <= 0.0 {
            top = 0.0;
            left = 0.0;
            size = 1.0;
        }

        Self { left, top, size }
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::full()
    }
}

impl FromStr for Region {
    type Err = ContourError;

    /// Parse `"left,top,size"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(ContourError::region(format!(
                "invalid format '{}', expected 'left,top,size'",
                s
            )));
        }

        let parse = |v: &str| -> ContourResult<f64> {
            v.parse()
                .map_err(|_| ContourError::region(format!("invalid number '{}'", v)))
        };

        Region::new(parse(parts[0])?, parse(parts[1])?, parse(parts[2])?)
    }
}
