//! Near-a-line test for the contour overlay mask.

use crate::distance::segment_distance_sqd;
use crate::index::SpatialIndex;
use contour_common::{ContourSet, Point, SourcePoint};
use serde::{Deserialize, Serialize};

/// Three-level proximity of a pixel to contour geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineProximity {
    #[default]
    None,
    /// A strip vertex lies within the wiggle distance.
    NearVertex,
    /// A segment body lies within the wiggle distance.
    NearSegment,
}

impl LineProximity {
    /// Mask level: 0.0, 0.5 or 1.0.
    pub fn level(&self) -> f64 {
        match self {
            LineProximity::None => 0.0,
            LineProximity::NearVertex => 0.5,
            LineProximity::NearSegment => 1.0,
        }
    }

    pub fn is_line(&self) -> bool {
        !matches!(self, LineProximity::None)
    }
}

/// Squared wiggle distance for one pixel of a `raster_size` raster covering
/// a region `region_size` wide.
#[inline]
pub fn wiggle_sqd(region_size: f64, raster_size: usize) -> f64 {
    let pixel = region_size / raster_size.max(1) as f64;
    pixel * pixel
}

/// Classify `point` against the segments listed in its home cell.
///
/// Vertices are checked across the whole cell before any segment body, so a
/// vertex anywhere in range wins over a closer segment.
pub fn line_proximity<P: SourcePoint>(
    contours: &ContourSet<P>,
    index: &SpatialIndex,
    point: Point,
    wiggle_sqd: f64,
) -> LineProximity {
    if !point.is_finite() {
        return LineProximity::None;
    }

    let refs = index.query(index.cell_of(point));
    let segments = || refs.iter().filter_map(|r| contours.segment(*r));

    let near_vertex = segments().any(|(start, end, _)| {
        point.distance_sqd(start) < wiggle_sqd || point.distance_sqd(end) < wiggle_sqd
    });
    if near_vertex {
        return LineProximity::NearVertex;
    }

    if segments().any(|(start, end, _)| segment_distance_sqd(point, start, end) < wiggle_sqd) {
        return LineProximity::NearSegment;
    }

    LineProximity::None
}
