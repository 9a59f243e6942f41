//! Expanding-ring nearest-segment search.
//!
//! Starting from the query point's home cell, square rings of cells at
//! Chebyshev distance 1, 2, 3, ... are fed to a [`SectorEstimator`] until it
//! reports that every sector is covered. The ring count is capped so a point
//! far from all geometry still terminates, returning whatever partial
//! estimate exists or [`NO_DATA`].

use crate::exclusions::CellExclusions;
use crate::index::SpatialIndex;
use crate::interpolate::SectorEstimator;
use contour_common::{Cell, ContourSet, Point, RasterConfig, SourcePoint};

/// Elevation written for pixels with no reachable geometry. Lies far outside
/// the valid `[0, 1]` elevation range.
pub const NO_DATA: f64 = 2e8;

/// Whether `elevation` is the no-data sentinel.
#[inline]
pub fn is_no_data(elevation: f64) -> bool {
    elevation >= NO_DATA * 0.5
}

/// Result of one point query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Interpolated elevation, or [`NO_DATA`].
    pub elevation: f64,
    /// Sectors populated when the search stopped.
    pub sectors: usize,
    /// Rings examined.
    pub rings: usize,
    /// The query point lies on a segment.
    pub on_line: bool,
}

impl Estimate {
    pub fn is_no_data(&self) -> bool {
        is_no_data(self.elevation)
    }
}

/// Cells at Chebyshev distance `distance` from `home` that lie inside a
/// `size x size` grid. Ring 1 also yields `home` itself, first.
pub fn ring_cells(home: Cell, distance: usize, size: usize) -> impl Iterator<Item = Cell> {
    let d = distance.max(1) as isize;
    let (cx, cy) = (home.x as isize, home.y as isize);

    let centre = (distance <= 1).then_some(home);
    let horizontal = (cx - d..=cx + d).flat_map(move |x| [(x, cy - d), (x, cy + d)]);
    // Corners were covered by the horizontal bars.
    let vertical = (cy - d + 1..=cy + d - 1).flat_map(move |y| [(cx - d, y), (cx + d, y)]);

    centre.into_iter().chain(
        horizontal
            .chain(vertical)
            .filter_map(move |(x, y)| Cell::checked(x, y, size)),
    )
}

/// Largest ring distance from `home` that can still reach a grid cell.
#[inline]
pub fn last_reachable_ring(home: Cell, size: usize) -> usize {
    let far_x = home.x.max(size - 1 - home.x);
    let far_y = home.y.max(size - 1 - home.y);
    far_x.max(far_y).max(1)
}

/// Borrowed view of everything a query needs; cheap to copy into workers.
#[derive(Debug, Clone, Copy)]
pub struct RingSearch<'a, P: SourcePoint> {
    contours: &'a ContourSet<P>,
    index: &'a SpatialIndex,
    exclusions: &'a CellExclusions,
    max_rings: usize,
    sector_count: usize,
    on_line_epsilon: f64,
}

impl<'a, P: SourcePoint> RingSearch<'a, P> {
    pub fn new(
        contours: &'a ContourSet<P>,
        index: &'a SpatialIndex,
        exclusions: &'a CellExclusions,
        config: &RasterConfig,
    ) -> Self {
        Self {
            contours,
            index,
            exclusions,
            max_rings: config.max_rings,
            sector_count: config.sector_count,
            on_line_epsilon: config.on_line_epsilon,
        }
    }

    /// A fresh estimator configured for this search.
    pub fn estimator(&self, point: Point) -> SectorEstimator {
        SectorEstimator::new(point, self.sector_count, self.on_line_epsilon)
    }

    /// Cells a ring may yield: in bounds, not excluded, and non-empty.
    #[inline]
    fn is_searchable(&self, cell: Cell) -> bool {
        self.index.count(cell) != 0 && !self.exclusions.is_excluded(cell)
    }

    /// Estimate the elevation at `point`.
    pub fn find_elevation(&self, point: Point) -> Estimate {
        let mut estimator = self.estimator(point);
        self.find_elevation_with(&mut estimator, point)
    }

    /// Same as [`find_elevation`](Self::find_elevation), reusing `estimator`.
    pub fn find_elevation_with(&self, estimator: &mut SectorEstimator, point: Point) -> Estimate {
        estimator.reset(point);

        if !point.is_finite() {
            return Estimate {
                elevation: NO_DATA,
                sectors: 0,
                rings: 0,
                on_line: false,
            };
        }

        let size = self.index.size();
        let home = self.index.cell_of(point);
        let ring_limit = self.max_rings.min(last_reachable_ring(home, size));

        let mut rings = 0;
        for distance in 1..=ring_limit {
            rings = distance;

            for cell in ring_cells(home, distance, size).filter(|c| self.is_searchable(*c)) {
                for segment in self.index.query(cell) {
                    let Some((start, end, elevation)) = self.contours.segment(*segment) else {
                        continue;
                    };

                    if let Some(on_line) = estimator.process_segment(start, end, elevation) {
                        return Estimate {
                            elevation: on_line,
                            sectors: estimator.populated(),
                            rings,
                            on_line: true,
                        };
                    }
                }
            }

            if estimator.has_sufficient_data() {
                break;
            }
        }

        Estimate {
            elevation: estimator.weighted_elevation().unwrap_or(NO_DATA),
            sectors: estimator.populated(),
            rings,
            on_line: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_first_ring_includes_home() {
        let cells: Vec<_> = ring_cells(Cell::new(5, 5), 1, 10).collect();
        assert_eq!(cells[0], Cell::new(5, 5));
        assert_eq!(cells.len(), 9);
        let unique: HashSet<_> = cells.iter().collect();
        assert_eq!(unique.len(), 9);
    }

    #[test]
    fn test_ring_perimeter_size() {
        let cells: Vec<_> = ring_cells(Cell::new(10, 10), 3, 30).collect();
        assert_eq!(cells.len(), 8 * 3);
        assert!(cells
            .iter()
            .all(|c| (c.x as isize - 10).abs().max((c.y as isize - 10).abs()) == 3));
    }

    #[test]
    fn test_ring_skips_out_of_bounds() {
        let cells: Vec<_> = ring_cells(Cell::new(0, 0), 1, 10).collect();
        assert_eq!(cells.len(), 4);
        let cells: Vec<_> = ring_cells(Cell::new(0, 0), 12, 10).collect();
        assert!(cells.is_empty());
    }

    #[test]
    fn test_last_reachable_ring() {
        assert_eq!(last_reachable_ring(Cell::new(0, 0), 10), 9);
        assert_eq!(last_reachable_ring(Cell::new(5, 4), 10), 5);
        assert_eq!(last_reachable_ring(Cell::new(0, 0), 2), 1);
    }

    #[test]
    fn test_no_data_sentinel_outside_range() {
        assert!(is_no_data(NO_DATA));
        assert!(!is_no_data(1.0));
        assert!(!is_no_data(0.0));
    }
}
