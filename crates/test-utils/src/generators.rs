//! Synthetic contour generators.
//!
//! All generators produce geometry already normalized to `[0, 1]` in both
//! coordinates and elevation, so the output can be handed straight to the
//! rasterizer. They are generic over the point precision.

use contour_common::{ContourSet, LineStrip, SourcePoint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

/// A single two-point strip from `(x0, y)` to `(x1, y)`.
///
/// # Example
///
/// ```
/// use contour_common::Point;
/// use test_utils::horizontal_segment;
///
/// let strip = horizontal_segment::<Point>(0.5, 0.2, 0.8, 0.4);
/// assert_eq!(strip.segment_count(), 1);
/// ```
pub fn horizontal_segment<P: SourcePoint>(y: f64, x0: f64, x1: f64, elevation: f64) -> LineStrip<P> {
    LineStrip::new(
        elevation,
        vec![P::from_normalized(x0, y), P::from_normalized(x1, y)],
    )
}

/// `count` horizontal lines spanning `[0.05, 0.95]`, evenly spaced in y,
/// with elevation rising from 0 (top) to 1 (bottom).
pub fn parallel_lines<P: SourcePoint>(count: usize) -> ContourSet<P> {
    let count = count.max(2);
    (0..count)
        .map(|i| {
            let y = (i + 1) as f64 / (count + 1) as f64;
            let elevation = i as f64 / (count - 1) as f64;
            horizontal_segment(y, 0.05, 0.95, elevation).with_elevation_id(i as u32)
        })
        .collect()
}

/// Closed circle of `points` vertices.
fn ring<P: SourcePoint>(cx: f64, cy: f64, radius: f64, points: usize) -> Vec<P> {
    let points = points.max(3);
    (0..=points)
        .map(|i| {
            let angle = TAU * (i % points) as f64 / points as f64;
            P::from_normalized(cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect()
}

/// `count` concentric circles around `(0.5, 0.5)` with radii up to 0.45.
/// The innermost ring is the highest (elevation 1), the outermost 0.
pub fn concentric_rings<P: SourcePoint>(count: usize, points_per_ring: usize) -> ContourSet<P> {
    let count = count.max(2);
    (0..count)
        .map(|i| {
            let radius = 0.45 * (i + 1) as f64 / count as f64;
            let elevation = 1.0 - i as f64 / (count - 1) as f64;
            LineStrip::new(elevation, ring(0.5, 0.5, radius, points_per_ring))
                .with_elevation_id(i as u32)
        })
        .collect()
}

/// A lumpy hill: concentric rings whose radii are perturbed by seeded noise,
/// split into several open strips per level. Deterministic for a given seed.
pub fn contour_hill<P: SourcePoint>(levels: usize, seed: u64) -> ContourSet<P> {
    let mut rng = StdRng::seed_from_u64(seed);
    let levels = levels.max(2);
    let vertices = 96;
    let pieces = 3;

    let mut strips = Vec::with_capacity(levels * pieces);
    for level in 0..levels {
        let base = 0.45 * (level + 1) as f64 / levels as f64;
        let elevation = 1.0 - level as f64 / (levels - 1) as f64;
        let wobble = 0.2 * base / levels as f64;

        let points: Vec<P> = (0..=vertices)
            .map(|i| {
                let angle = TAU * (i % vertices) as f64 / vertices as f64;
                let r = base + rng.gen_range(-wobble..=wobble);
                P::from_normalized(0.5 + r * angle.cos(), 0.5 + r * angle.sin())
            })
            .collect();

        let per_piece = vertices / pieces;
        for piece in 0..pieces {
            let start = piece * per_piece;
            let end = if piece + 1 == pieces {
                points.len()
            } else {
                start + per_piece + 1
            };
            strips.push(
                LineStrip::new(elevation, points[start..end].to_vec())
                    .with_elevation_id(level as u32),
            );
        }
    }

    ContourSet::new(strips)
}

/// `count` random short strips scattered over the unit square.
pub fn random_strips<P: SourcePoint>(count: usize, seed: u64) -> ContourSet<P> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let len = rng.gen_range(2..8);
            let mut x = rng.gen_range(0.05..0.95);
            let mut y = rng.gen_range(0.05..0.95);
            let points = (0..len)
                .map(|_| {
                    let p = P::from_normalized(x, y);
                    x = (x + rng.gen_range(-0.03..0.03)).clamp(0.0, 1.0);
                    y = (y + rng.gen_range(-0.03..0.03)).clamp(0.0, 1.0);
                    p
                })
                .collect();
            LineStrip::new(rng.gen_range(0.0..=1.0), points).with_elevation_id(i as u32)
        })
        .collect()
}
