//! Points and grid cells in normalized `[0,1] x [0,1]` space.

use crate::config::Precision;
use serde::{Deserialize, Serialize};

/// A double-precision point ("high resolution").
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[inline]
    pub fn distance_sqd(&self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Vector from `self` to `other`.
    #[inline]
    pub fn to(&self, other: Point) -> Point {
        Point::new(other.x - self.x, other.y - self.y)
    }

    #[inline]
    pub fn dot(&self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn length_sqd(&self) -> f64 {
        self.dot(*self)
    }

    /// `self + direction * t`
    #[inline]
    pub fn offset(&self, direction: Point, t: f64) -> Point {
        Point::new(self.x + direction.x * t, self.y + direction.y * t)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A single-precision point ("low resolution"), halving geometry memory.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LowResPoint {
    pub x: f32,
    pub y: f32,
}

impl LowResPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Storage representation for contour points.
///
/// A loaded dataset uses exactly one implementation throughout; all distance
/// math is carried out on the widened [`Point`].
pub trait SourcePoint: Copy + Send + Sync + std::fmt::Debug + 'static {
    /// The precision this representation corresponds to.
    const PRECISION: Precision;

    /// Build from normalized double-precision coordinates.
    fn from_normalized(x: f64, y: f64) -> Self;

    /// Widen to a double-precision point.
    fn to_point(self) -> Point;
}

impl SourcePoint for Point {
    const PRECISION: Precision = Precision::High;

    #[inline]
    fn from_normalized(x: f64, y: f64) -> Self {
        Point::new(x, y)
    }

    #[inline]
    fn to_point(self) -> Point {
        self
    }
}

impl SourcePoint for LowResPoint {
    const PRECISION: Precision = Precision::Low;

    #[inline]
    fn from_normalized(x: f64, y: f64) -> Self {
        LowResPoint::new(x as f32, y as f32)
    }

    #[inline]
    fn to_point(self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

/// One cell of a `size x size` uniform grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Map a normalized point to its cell: `floor(coord * size)` clamped to
    /// `[0, size - 1]` on each axis. Non-finite coordinates land in cell 0.
    pub fn containing(point: Point, size: usize) -> Self {
        Self {
            x: axis_cell(point.x, size),
            y: axis_cell(point.y, size),
        }
    }

    /// Build a cell from signed coordinates, `None` when outside the grid.
    pub fn checked(x: isize, y: isize, size: usize) -> Option<Self> {
        if x < 0 || y < 0 || x as usize >= size || y as usize >= size {
            return None;
        }
        Some(Self::new(x as usize, y as usize))
    }

    /// Flat index into a row-major `size x size` array.
    #[inline]
    pub fn flat_index(&self, size: usize) -> usize {
        self.x + self.y * size
    }
}

#[inline]
fn axis_cell(coord: f64, size: usize) -> usize {
    let scaled = (coord * size as f64).floor();
    if scaled.is_nan() || scaled <= 0.0 {
        0
    } else {
        (scaled as usize).min(size - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_containing_clamps() {
        assert_eq!(Cell::containing(Point::new(0.0, 0.0), 10), Cell::new(0, 0));
        assert_eq!(Cell::containing(Point::new(0.35, 0.99), 10), Cell::new(3, 9));
        assert_eq!(Cell::containing(Point::new(1.0, 1.0), 10), Cell::new(9, 9));
        assert_eq!(Cell::containing(Point::new(-0.2, 1.7), 10), Cell::new(0, 9));
        assert_eq!(Cell::containing(Point::new(f64::NAN, 0.5), 10), Cell::new(0, 5));
    }

    #[test]
    fn test_cell_checked_bounds() {
        assert_eq!(Cell::checked(-1, 0, 4), None);
        assert_eq!(Cell::checked(4, 0, 4), None);
        assert_eq!(Cell::checked(3, 3, 4), Some(Cell::new(3, 3)));
    }

    #[test]
    fn test_low_res_widening() {
        let p = LowResPoint::from_normalized(0.25, 0.5);
        assert_eq!(p.to_point(), Point::new(0.25, 0.5));
        assert_eq!(<LowResPoint as SourcePoint>::PRECISION, Precision::Low);
    }

    #[test]
    fn test_point_vector_math() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_sqd(b), 25.0);
        assert_eq!(a.to(b).length_sqd(), 25.0);
        assert_eq!(a.offset(b, 0.5), Point::new(1.5, 2.0));
    }
}
