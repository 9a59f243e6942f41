//! Angular-sector inverse-distance-squared elevation estimator.
//!
//! Candidate segments are binned by the direction from the query point to
//! their closest point. Each sector keeps only its nearest candidate. The
//! query counts as surrounded once every sector holds a candidate, which
//! keeps a point sampled from one side only from being biased toward that
//! side's elevation.

use crate::distance::{angle_to, closest_point_on_segment, sector_of};
use contour_common::config::{DEFAULT_ON_LINE_EPSILON, DEFAULT_SECTOR_COUNT, MAX_SECTOR_COUNT};
use contour_common::Point;

#[derive(Debug, Clone, Copy)]
struct SectorSample {
    distance_sqd: f64,
    elevation: f64,
}

/// Per-query sector state. Allocation free; reset between queries.
#[derive(Debug, Clone)]
pub struct SectorEstimator {
    point: Point,
    sector_count: usize,
    on_line_epsilon: f64,
    populated: usize,
    sectors: [Option<SectorSample>; MAX_SECTOR_COUNT],
}

impl SectorEstimator {
    /// `sector_count` is clamped into `2..=MAX_SECTOR_COUNT`.
    pub fn new(point: Point, sector_count: usize, on_line_epsilon: f64) -> Self {
        Self {
            point,
            sector_count: sector_count.clamp(2, MAX_SECTOR_COUNT),
            on_line_epsilon,
            populated: 0,
            sectors: [None; MAX_SECTOR_COUNT],
        }
    }

    /// Estimator with the default ten sectors.
    pub fn with_defaults(point: Point) -> Self {
        Self::new(point, DEFAULT_SECTOR_COUNT, DEFAULT_ON_LINE_EPSILON)
    }

    /// Start over for a new query point.
    pub fn reset(&mut self, point: Point) {
        self.point = point;
        self.populated = 0;
        self.sectors[..self.sector_count].fill(None);
    }

    pub fn point(&self) -> Point {
        self.point
    }

    /// Offer one candidate segment.
    ///
    /// Returns `Some(elevation)` when the query point lies on the segment
    /// (squared distance within epsilon); the caller may stop there.
    pub fn process_segment(&mut self, start: Point, end: Point, elevation: f64) -> Option<f64> {
        let closest = closest_point_on_segment(self.point, start, end);
        let distance_sqd = self.point.distance_sqd(closest);

        if distance_sqd <= self.on_line_epsilon || distance_sqd == 0.0 {
            return Some(elevation);
        }
        if !distance_sqd.is_finite() || !elevation.is_finite() {
            return None;
        }

        let sector = sector_of(angle_to(self.point, closest), self.sector_count);
        let sample = SectorSample {
            distance_sqd,
            elevation,
        };
        match self.sectors[sector] {
            Some(existing) if existing.distance_sqd <= distance_sqd => {}
            Some(_) => self.sectors[sector] = Some(sample),
            None => {
                self.sectors[sector] = Some(sample);
                self.populated += 1;
            }
        }

        None
    }

    /// Number of sectors holding a candidate. Never decreases until reset.
    pub fn populated(&self) -> usize {
        self.populated
    }

    pub fn sector_count(&self) -> usize {
        self.sector_count
    }

    /// True once every sector holds a candidate.
    pub fn has_sufficient_data(&self) -> bool {
        self.populated == self.sector_count
    }

    /// `Σ(e / d²) / Σ(1 / d²)` over populated sectors, `None` when empty.
    pub fn weighted_elevation(&self) -> Option<f64> {
        if self.populated == 0 {
            return None;
        }

        let (weighted, weights) = self.sectors[..self.sector_count]
            .iter()
            .flatten()
            .fold((0.0, 0.0), |(weighted, weights), sample| {
                let weight = 1.0 / sample.distance_sqd;
                (weighted + sample.elevation * weight, weights + weight)
            });

        Some(weighted / weights)
    }

    /// Squared distance of the candidate held by `sector`, if any.
    pub fn sector_distance_sqd(&self, sector: usize) -> Option<f64> {
        self.sectors
            .get(..self.sector_count)?
            .get(sector)?
            .map(|s| s.distance_sqd)
    }
}
