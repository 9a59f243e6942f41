//! Contour rasterization engine.
//!
//! Turns a set of normalized contour line strips into a dense elevation
//! field and a three-level line-proximity mask:
//!
//! 1. [`SpatialIndex`] buckets every segment into the grid cells it touches.
//! 2. [`RingSearch`] walks square rings of cells outward from a query point.
//! 3. [`SectorEstimator`] keeps the nearest candidate per angular sector and
//!    produces an inverse-distance-squared weighted elevation.
//! 4. [`ColumnScheduler`] spreads per-column work over a worker pool with
//!    dynamic reassignment.
//!
//! [`Rasterizer`] ties these together; the [`png`] module exports results.
//!
//! # Example
//!
//! ```
//! use contour_common::{ContourSet, LineStrip, Point, RasterConfig, Region};
//! use contour_raster::Rasterizer;
//!
//! let contours = ContourSet::new(vec![
//!     LineStrip::new(0.0, vec![Point::new(0.1, 0.4), Point::new(0.9, 0.4)]),
//!     LineStrip::new(1.0, vec![Point::new(0.1, 0.6), Point::new(0.9, 0.6)]),
//! ]);
//! let engine = Rasterizer::setup(&contours, RasterConfig::with_size(16)).unwrap();
//! let mut field = vec![0.0; engine.pixel_count()];
//! let stats = engine.rasterize(&Region::full(), &mut field).unwrap();
//! assert_eq!(stats.columns, 16);
//! ```

pub mod distance;
pub mod exclusions;
pub mod index;
pub mod interpolate;
pub mod png;
pub mod proximity;
pub mod rasterizer;
pub mod scheduler;
pub mod search;

pub use exclusions::CellExclusions;
pub use index::SpatialIndex;
pub use interpolate::SectorEstimator;
pub use png::{ExportError, ExportResult};
pub use proximity::LineProximity;
pub use rasterizer::{MaskStats, RasterStats, Rasterizer};
pub use scheduler::{ColumnScheduler, PassReport};
pub use search::{is_no_data, Estimate, RingSearch, NO_DATA};
