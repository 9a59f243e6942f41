//! The rasterization engine: index, search and scheduler wired together.

use crate::exclusions::CellExclusions;
use crate::index::SpatialIndex;
use crate::proximity::{self, wiggle_sqd, LineProximity};
use crate::scheduler::ColumnScheduler;
use crate::search::{is_no_data, Estimate, RingSearch, NO_DATA};
use contour_common::{ContourError, ContourResult, ContourSet, Point, RasterConfig, Region, SourcePoint};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Summary of an elevation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterStats {
    /// Lowest non-sentinel elevation, if any pixel found data.
    pub min_elevation: Option<f64>,
    /// Highest non-sentinel elevation.
    pub max_elevation: Option<f64>,
    pub no_data_pixels: usize,
    pub columns: usize,
    pub workers: usize,
    pub failed_columns: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RasterStats {
    /// `max - min` over valid pixels, or 0 when there are none.
    pub fn elevation_span(&self) -> f64 {
        match (self.min_elevation, self.max_elevation) {
            (Some(min), Some(max)) => max - min,
            _ => 0.0,
        }
    }
}

/// Summary of a line-mask pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaskStats {
    pub near_vertex: usize,
    pub near_segment: usize,
}

impl MaskStats {
    pub fn line_pixels(&self) -> usize {
        self.near_vertex + self.near_segment
    }
}

#[derive(Debug, Clone, Copy)]
struct ElevationRange {
    min: f64,
    max: f64,
    no_data: usize,
}

impl ElevationRange {
    const EMPTY: Self = Self {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
        no_data: 0,
    };

    fn add(mut self, value: f64) -> Self {
        if is_no_data(value) {
            self.no_data += 1;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            no_data: self.no_data + other.no_data,
        }
    }
}

/// Elevation rasterizer over one loaded contour set.
///
/// Holds the spatial index for the lifetime of the engine; geometry is
/// borrowed and never modified. Output buffers are owned by the caller.
#[derive(Debug)]
pub struct Rasterizer<'a, P: SourcePoint> {
    contours: &'a ContourSet<P>,
    config: RasterConfig,
    index: SpatialIndex,
    exclusions: CellExclusions,
}

impl<'a, P: SourcePoint> Rasterizer<'a, P> {
    /// Validate `config` against `contours` and build the spatial index.
    pub fn setup(contours: &'a ContourSet<P>, config: RasterConfig) -> ContourResult<Self> {
        config.validate()?;

        if config.precision != P::PRECISION {
            return Err(ContourError::PrecisionMismatch {
                loaded: P::PRECISION.to_string(),
                requested: config.precision.to_string(),
            });
        }
        if contours.is_empty() || contours.segment_count() == 0 {
            return Err(ContourError::EmptyGeometry);
        }

        info!(
            strips = contours.len(),
            segments = contours.segment_count(),
            size = config.size,
            precision = %config.precision,
            "Setting up rasterizer"
        );

        let index = SpatialIndex::build(contours, config.size);

        Ok(Self {
            contours,
            config,
            index,
            exclusions: CellExclusions::default(),
        })
    }

    /// Skip `exclusions` during every subsequent search.
    pub fn with_exclusions(mut self, exclusions: CellExclusions) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn exclusions(&self) -> &CellExclusions {
        &self.exclusions
    }

    pub fn exclusions_mut(&mut self) -> &mut CellExclusions {
        &mut self.exclusions
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn contours(&self) -> &ContourSet<P> {
        self.contours
    }

    /// Output buffer length for this engine.
    pub fn pixel_count(&self) -> usize {
        self.config.pixel_count()
    }

    fn search(&self) -> RingSearch<'_, P> {
        RingSearch::new(self.contours, &self.index, &self.exclusions, &self.config)
    }

    /// Interpolated elevation at one normalized point.
    pub fn estimate(&self, point: Point) -> Estimate {
        self.search().find_elevation(point)
    }

    /// Proximity of one normalized point to the contour lines.
    pub fn line_proximity(&self, point: Point, wiggle_sqd: f64) -> LineProximity {
        proximity::line_proximity(self.contours, &self.index, point, wiggle_sqd)
    }

    fn check_pass(&self, region: &Region, len: usize) -> ContourResult<()> {
        region.validate()?;
        let expected = self.pixel_count();
        if len != expected {
            return Err(ContourError::BufferSize {
                expected,
                actual: len,
            });
        }
        Ok(())
    }

    /// Fill `output` (row-major, `size * size`) with elevations sampled over
    /// `region`. Pixels without reachable data receive [`NO_DATA`].
    pub fn rasterize(&self, region: &Region, output: &mut [f64]) -> ContourResult<RasterStats> {
        self.check_pass(region, output.len())?;

        let size = self.config.size;
        let search = self.search();
        let region = *region;

        info!(
            left = region.left,
            top = region.top,
            view = region.size,
            size,
            "Rasterizing elevation"
        );

        let scheduler = ColumnScheduler::new(self.config.worker_count());
        let report = scheduler.run(size, output, NO_DATA, |column, out| {
            let mut estimator = search.estimator(Point::default());
            for (row, value) in out.iter_mut().enumerate() {
                let point = region.pixel_to_point(column, row, size);
                *value = search.find_elevation_with(&mut estimator, point).elevation;
            }
        })?;

        let range = output
            .par_iter()
            .fold(|| ElevationRange::EMPTY, |acc, v| acc.add(*v))
            .reduce(|| ElevationRange::EMPTY, ElevationRange::merge);
        let has_data = range.no_data < output.len();

        let stats = RasterStats {
            min_elevation: has_data.then_some(range.min),
            max_elevation: has_data.then_some(range.max),
            no_data_pixels: range.no_data,
            columns: report.columns,
            workers: report.workers,
            failed_columns: report.failed_columns.len(),
            elapsed: report.elapsed,
        };

        info!(
            min = ?stats.min_elevation,
            max = ?stats.max_elevation,
            no_data = stats.no_data_pixels,
            workers = stats.workers,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "Elevation pass complete"
        );

        Ok(stats)
    }

    /// Fill `output` with the three-level line mask over `region`.
    pub fn rasterize_line_mask(
        &self,
        region: &Region,
        output: &mut [LineProximity],
    ) -> ContourResult<MaskStats> {
        self.check_pass(region, output.len())?;

        let size = self.config.size;
        let region = *region;
        let wiggle = wiggle_sqd(region.size, size);

        info!(size, wiggle_sqd = wiggle, "Rasterizing line mask");

        let scheduler = ColumnScheduler::new(self.config.worker_count());
        let report = scheduler.run(size, output, LineProximity::None, |column, out| {
            for (row, value) in out.iter_mut().enumerate() {
                let point = region.pixel_to_point(column, row, size);
                *value = self.line_proximity(point, wiggle);
            }
        })?;

        let stats = output
            .par_iter()
            .fold(MaskStats::default, |mut acc, p| {
                match p {
                    LineProximity::NearVertex => acc.near_vertex += 1,
                    LineProximity::NearSegment => acc.near_segment += 1,
                    LineProximity::None => {}
                }
                acc
            })
            .reduce(MaskStats::default, |a, b| MaskStats {
                near_vertex: a.near_vertex + b.near_vertex,
                near_segment: b.near_segment + a.near_segment,
            });

        info!(
            near_vertex = stats.near_vertex,
            near_segment = stats.near_segment,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Line mask pass complete"
        );

        Ok(stats)
    }
}
