//! Uniform grid index over contour segments.
//!
//! The grid splits `[0,1] x [0,1]` into `size x size` cells. Each cell lists
//! every segment that starts in it, ends in it, or crosses it. Crossed cells
//! are found with a digital line walk along the axis of greater extent; each
//! walked cell is also dilated by one cell on the minor axis.
//!
//! The dilation is a heuristic against quantizing a continuous line onto
//! whole cells. It makes near-tangent crossings very unlikely to be missed
//! but is not an exact geometric guarantee: a segment that clips the corner
//! of a cell outside the dilated band will not be listed there. The ring
//! search tolerates this because it always widens past the home cell.

use contour_common::{Cell, ContourSet, Point, SegmentRef, SourcePoint};
use std::time::Instant;
use tracing::{debug, info};

/// Grid of segment references. Built once, then shared read-only.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    size: usize,
    cells: Vec<Vec<SegmentRef>>,
}

impl SpatialIndex {
    /// Allocate `size * size` empty cells.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Vec::new(); size * size],
        }
    }

    /// Index every segment of `contours` on a `size x size` grid.
    pub fn build<P: SourcePoint>(contours: &ContourSet<P>, size: usize) -> Self {
        let start = Instant::now();
        let mut index = Self::new(size);
        let strip_count = contours.len();
        let progress_step = (strip_count / 10).max(1);

        info!(strips = strip_count, size, "Building spatial index");

        for (strip_idx, strip) in contours.strips().iter().enumerate() {
            for point_idx in 0..strip.segment_count() {
                if let Some((a, b)) = strip.segment(point_idx) {
                    index.insert(SegmentRef::new(strip_idx, point_idx), a, b);
                }
            }

            if strip_idx % progress_step == 0 {
                debug!(strip = strip_idx, of = strip_count, "Indexed line strips");
            }
        }

        info!(
            references = index.total_references(),
            occupied = index.occupied_cells(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Spatial index built"
        );

        index
    }

    /// Drop all references, keeping the grid size.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Add a segment to every cell it touches.
    pub fn insert(&mut self, segment: SegmentRef, start: Point, end: Point) {
        let from = Cell::containing(start, self.size);
        let to = Cell::containing(end, self.size);

        for cell in traversed_cells(from, to, self.size) {
            let flat = cell.flat_index(self.size);
            self.cells[flat].push(segment);
        }
    }

    /// References held by `cell`. Out-of-bounds cells are empty.
    #[inline]
    pub fn query(&self, cell: Cell) -> &[SegmentRef] {
        if cell.x >= self.size || cell.y >= self.size {
            return &[];
        }
        &self.cells[cell.flat_index(self.size)]
    }

    #[inline]
    pub fn count(&self, cell: Cell) -> usize {
        self.query(cell).len()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Home cell of a normalized point.
    #[inline]
    pub fn cell_of(&self, point: Point) -> Cell {
        Cell::containing(point, self.size)
    }

    pub fn total_references(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }
}

/// Cells a segment from cell `from` to cell `to` is inserted into, without
/// duplicates.
///
/// Both endpoint cells are always included. When they differ, the walk steps
/// one cell at a time along the major axis, interpolating the minor axis, and
/// adds the minor-axis neighbours on both sides of each step.
pub fn traversed_cells(from: Cell, to: Cell, size: usize) -> Vec<Cell> {
    let mut cells = vec![from];
    if from == to {
        return cells;
    }
    cells.push(to);

    let (x0, y0) = (from.x as isize, from.y as isize);
    let (x1, y1) = (to.x as isize, to.y as isize);
    let dx = x1 - x0;
    let dy = y1 - y0;

    if dx.abs() >= dy.abs() {
        let step = dx.signum();
        let slope = dy as f64 / dx.abs() as f64;
        for i in 1..=dx.abs() {
            let x = x0 + step * i;
            let y = (y0 as f64 + slope * i as f64).round() as isize;
            for minor in [y - 1, y, y + 1] {
                cells.extend(Cell::checked(x, minor, size));
            }
        }
    } else {
        let step = dy.signum();
        let slope = dx as f64 / dy.abs() as f64;
        for i in 1..=dy.abs() {
            let y = y0 + step * i;
            let x = (x0 as f64 + slope * i as f64).round() as isize;
            for minor in [x - 1, x, x + 1] {
                cells.extend(Cell::checked(minor, y, size));
            }
        }
    }

    cells.sort_unstable();
    cells.dedup();
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use contour_common::LineStrip;

    #[test]
    fn test_new_index_is_empty() {
        let index = SpatialIndex::new(4);
        assert_eq!(index.size(), 4);
        assert_eq!(index.total_references(), 0);
        assert_eq!(index.count(Cell::new(3, 3)), 0);
        assert!(index.query(Cell::new(9, 9)).is_empty());
    }

    #[test]
    fn test_same_cell_segment() {
        let cells = traversed_cells(Cell::new(2, 2), Cell::new(2, 2), 10);
        assert_eq!(cells, vec![Cell::new(2, 2)]);
    }

    #[test]
    fn test_horizontal_walk_dilates_minor_axis() {
        let cells = traversed_cells(Cell::new(1, 5), Cell::new(4, 5), 10);
        // Start cell, then x = 2..=4 each with y = 4, 5, 6.
        assert_eq!(cells.len(), 1 + 3 * 3);
        assert!(cells.contains(&Cell::new(1, 5)));
        assert!(!cells.contains(&Cell::new(1, 4)));
        assert!(cells.contains(&Cell::new(3, 6)));
        assert!(cells.contains(&Cell::new(4, 4)));
    }

    #[test]
    fn test_vertical_walk_uses_x_for_minor_axis() {
        let cells = traversed_cells(Cell::new(7, 0), Cell::new(7, 3), 10);
        assert!(cells.contains(&Cell::new(6, 2)));
        assert!(cells.contains(&Cell::new(8, 2)));
        assert!(cells.iter().all(|c| (6..=8).contains(&c.x)));
    }

    #[test]
    fn test_walk_clips_at_grid_edge() {
        let cells = traversed_cells(Cell::new(0, 0), Cell::new(3, 0), 4);
        assert!(cells.iter().all(|c| c.x < 4 && c.y < 4));
        assert_eq!(cells.len(), 1 + 3 * 2);
    }

    #[test]
    fn test_diagonal_walk_is_connected() {
        let cells = traversed_cells(Cell::new(0, 0), Cell::new(9, 6), 10);
        for x in 0..=9 {
            assert!(cells.iter().any(|c| c.x == x), "column {} missing", x);
        }
    }

    #[test]
    fn test_build_indexes_every_segment() {
        let contours = ContourSet::new(vec![LineStrip::new(
            0.5,
            vec![
                Point::new(0.05, 0.05),
                Point::new(0.95, 0.05),
                Point::new(0.95, 0.95),
            ],
        )]);
        let index = SpatialIndex::build(&contours, 10);

        assert_eq!(index.query(Cell::new(0, 0)), &[SegmentRef::new(0, 0)]);
        assert!(index.query(Cell::new(9, 5)).contains(&SegmentRef::new(0, 1)));
        // Corner cell holds the end of segment 0 and the start of segment 1.
        assert_eq!(index.count(Cell::new(9, 0)), 2);
    }
}
