//! Contour geometry loading.
//!
//! Reads GeoJSON `LineString` / `MultiLineString` contour features and
//! normalizes them into the unit square expected by the rasterizer:
//!
//! ```ignore
//! use contour_common::Point;
//! use contour_ingest::{load_files, LoadOptions};
//!
//! let loaded = load_files::<Point>(&paths, &LoadOptions::default())?;
//! println!("{} strips", loaded.contours.len());
//! ```

pub mod bounds;
pub mod error;
pub mod geojson;

pub use bounds::SourceBounds;
pub use error::{IngestError, Result};
pub use geojson::{
    compute_bounds, load_files, normalize, parse_collection, LoadOptions, LoadedContours, RawLine,
    DEFAULT_ELEVATION_PROPERTY,
};
