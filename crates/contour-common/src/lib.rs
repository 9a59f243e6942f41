//! Common types shared across the contour tiling crates.
//!
//! - [`Point`] / [`LowResPoint`]: normalized coordinates at two precisions
//! - [`LineStrip`] / [`ContourSet`]: immutable contour geometry
//! - [`SegmentRef`]: lightweight handle to one segment of one strip
//! - [`Region`]: a square sub-region of the normalized space
//! - [`RasterConfig`]: resolution, precision and search tuning

pub mod config;
pub mod error;
pub mod geometry;
pub mod region;
pub mod strip;

pub use config::{Precision, RasterConfig};
pub use error::{ContourError, ContourResult};
pub use geometry::{Cell, LowResPoint, Point, SourcePoint};
pub use region::Region;
pub use strip::{ContourSet, LineStrip, SegmentRef};
