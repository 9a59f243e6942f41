//! Point-to-segment distance and angular primitives.

use contour_common::Point;
use std::f64::consts::TAU;

/// Closest point on segment `start..end` to `point`.
///
/// The projection fraction is clamped to `[0, 1]`, so the result always lies
/// on the segment itself: a fraction below 0 yields `start`, above 1 yields
/// `end`. A zero-length segment is treated as the single point `start`.
#[inline]
pub fn closest_point_on_segment(point: Point, start: Point, end: Point) -> Point {
    let start_to_end = start.to(end);
    let length_sqd = start_to_end.length_sqd();
    if length_sqd <= 0.0 || !length_sqd.is_finite() {
        return start;
    }

    let fraction = start.to(point).dot(start_to_end) / length_sqd;
    if fraction <= 0.0 {
        start
    } else if fraction >= 1.0 {
        end
    } else {
        start.offset(start_to_end, fraction)
    }
}

/// Squared distance from `point` to the nearest point of `start..end`.
#[inline]
pub fn segment_distance_sqd(point: Point, start: Point, end: Point) -> f64 {
    point.distance_sqd(closest_point_on_segment(point, start, end))
}

/// Angle from `origin` to `target`, folded into `[0, 2π)`.
#[inline]
pub fn angle_to(origin: Point, target: Point) -> f64 {
    let angle = (target.y - origin.y).atan2(target.x - origin.x);
    if angle < 0.0 {
        // atan2 of a tiny negative y can round up to exactly TAU
        let folded = angle + TAU;
        if folded >= TAU {
            0.0
        } else {
            folded
        }
    } else {
        angle
    }
}

/// Sector of `angle` among `sectors` equal wedges: `floor(sectors * angle / 2π)`.
#[inline]
pub fn sector_of(angle: f64, sectors: usize) -> usize {
    let sector = (sectors as f64 * angle / TAU).floor();
    if sector.is_nan() || sector <= 0.0 {
        0
    } else {
        (sector as usize).min(sectors - 1)
    }
}
