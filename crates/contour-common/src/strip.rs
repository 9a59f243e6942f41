//! Contour line strips and the immutable set they are loaded into.

use crate::geometry::{Point, SourcePoint};
use serde::{Deserialize, Serialize};

/// An ordered polyline at one normalized elevation.
///
/// A strip of N points implies N-1 segments; segment `k` runs from point `k`
/// to point `k + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStrip<P = Point> {
    /// Elevation normalized to `[0, 1]`.
    pub elevation: f64,
    /// Dense id shared by all strips of the same source elevation.
    pub elevation_id: u32,
    pub points: Vec<P>,
}

impl<P: SourcePoint> LineStrip<P> {
    pub fn new(elevation: f64, points: Vec<P>) -> Self {
        Self {
            elevation,
            elevation_id: 0,
            points,
        }
    }

    pub fn with_elevation_id(mut self, id: u32) -> Self {
        self.elevation_id = id;
        self
    }

    /// Number of segments this strip contributes.
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Endpoints of segment `index`, widened to double precision.
    #[inline]
    pub fn segment(&self, index: usize) -> Option<(Point, Point)> {
        let start = self.points.get(index)?;
        let end = self.points.get(index + 1)?;
        Some((start.to_point(), end.to_point()))
    }
}

/// Most strips a [`ContourSet`] holds, and most points per strip.
///
/// Both stay below `u32::MAX`, so `u32::MAX` never names a real strip or
/// segment.
pub const MAX_STRIPS: usize = u32::MAX as usize;
pub const MAX_STRIP_POINTS: usize = u32::MAX as usize;

/// Handle to segment `point` of strip `strip`. Never copies geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentRef {
    pub strip: u32,
    pub point: u32,
}

impl SegmentRef {
    /// Indices that do not fit in `u32` saturate to `u32::MAX`, which
    /// [`ContourSet::segment`] resolves to nothing.
    pub fn new(strip: usize, point: usize) -> Self {
        Self {
            strip: u32::try_from(strip).unwrap_or(u32::MAX),
            point: u32::try_from(point).unwrap_or(u32::MAX),
        }
    }
}

/// The finalized, read-only geometry a rasterization pass runs against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourSet<P = Point> {
    strips: Vec<LineStrip<P>>,
}

impl<P: SourcePoint> ContourSet<P> {
    /// Build a set, discarding strips with fewer than two or more than
    /// [`MAX_STRIP_POINTS`] points. At most [`MAX_STRIPS`] strips are kept.
    pub fn new(strips: Vec<LineStrip<P>>) -> Self {
        Self {
            strips: strips
                .into_iter()
                .filter(|s| (2..=MAX_STRIP_POINTS).contains(&s.points.len()))
                .take(MAX_STRIPS)
                .collect(),
        }
    }

    pub fn strips(&self) -> &[LineStrip<P>] {
        &self.strips
    }

    pub fn len(&self) -> usize {
        self.strips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strips.is_empty()
    }

    /// Total number of segments across all strips.
    pub fn segment_count(&self) -> usize {
        self.strips.iter().map(LineStrip::segment_count).sum()
    }

    /// Resolve a segment reference to its endpoints and elevation.
    #[inline]
    pub fn segment(&self, index: SegmentRef) -> Option<(Point, Point, f64)> {
        let strip = self.strips.get(index.strip as usize)?;
        let (start, end) = strip.segment(index.point as usize)?;
        Some((start, end, strip.elevation))
    }
}

impl<P: SourcePoint> FromIterator<LineStrip<P>> for ContourSet<P> {
    fn from_iter<I: IntoIterator<Item = LineStrip<P>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LowResPoint;

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_oversized_segment_ref_resolves_to_nothing() {
        let set = ContourSet::new(vec![LineStrip::new(
            0.5,
            vec![Point::new(0.1, 0.1), Point::new(0.9, 0.9)],
        )]);

        let strip_overflow = SegmentRef::new(u32::MAX as usize + 1, 0);
        assert_eq!(strip_overflow.strip, u32::MAX);
        assert!(set.segment(strip_overflow).is_none());

        let point_overflow = SegmentRef::new(0, u32::MAX as usize + 1);
        assert_eq!(point_overflow.point, u32::MAX);
        assert!(set.segment(point_overflow).is_none());

        assert!(set.segment(SegmentRef::new(0, 0)).is_some());
    }

    #[test]
    fn test_short_strips_dropped() {
        let set: ContourSet = vec![
            LineStrip::new(0.1, vec![Point::new(0.0, 0.0)]),
            LineStrip::new(0.2, vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 1);
        assert_eq!(set.segment_count(), 1);
    }

    #[test]
    fn test_segment_lookup() {
        let set = ContourSet::new(vec![LineStrip::new(
            0.7,
            vec![
                LowResPoint::new(0.0, 0.0),
                LowResPoint::new(0.5, 0.0),
                LowResPoint::new(0.5, 0.5),
            ],
        )]);

        let (start, end, elevation) = set.segment(SegmentRef::new(0, 1)).unwrap();
        assert_eq!(start, Point::new(0.5, 0.0));
        assert_eq!(end, Point::new(0.5, 0.5));
        assert_eq!(elevation, 0.7);

        // Last point has no outgoing segment.
        assert!(set.segment(SegmentRef::new(0, 2)).is_none());
        assert!(set.segment(SegmentRef::new(3, 0)).is_none());
    }
}
