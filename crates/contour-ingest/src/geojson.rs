//! GeoJSON contour loading.
//!
//! Loading happens in two passes. The first parses every file into raw
//! source-unit lines and accumulates a combined [`SourceBounds`]; the second
//! maps every coordinate and elevation into `[0, 1]` and builds the
//! [`ContourSet`] at the requested precision.

use crate::bounds::SourceBounds;
use crate::error::{IngestError, Result};
use contour_common::{ContourSet, LineStrip, SourcePoint};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default name of the per-feature elevation property.
pub const DEFAULT_ELEVATION_PROPERTY: &str = "Elevation";

/// Options for [`load_files`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Property holding each feature's elevation. Matched exactly first,
    /// then case-insensitively.
    pub elevation_property: String,
    /// Fixed normalization extent. When unset the extent is computed from the
    /// data; when set, any coordinate outside it is an error.
    pub bounds: Option<SourceBounds>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            elevation_property: DEFAULT_ELEVATION_PROPERTY.to_string(),
            bounds: None,
        }
    }
}

impl LoadOptions {
    pub fn with_elevation_property(mut self, name: impl Into<String>) -> Self {
        self.elevation_property = name.into();
        self
    }

    pub fn with_bounds(mut self, bounds: SourceBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// One contour line in source units, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    pub elevation: f64,
    pub points: Vec<(f64, f64)>,
}

/// Normalized contours plus the extent they were normalized against.
#[derive(Debug, Clone)]
pub struct LoadedContours<P: SourcePoint> {
    pub contours: ContourSet<P>,
    pub bounds: SourceBounds,
    /// Distinct source elevations, indexed by elevation id.
    pub elevations: Vec<f64>,
    /// Lines dropped for having fewer than two points.
    pub dropped: usize,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

/// Look up `name` exactly, then ignoring ASCII case.
fn find_property<'a>(properties: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    properties.get(name).or_else(|| {
        properties
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

fn elevation_of(feature: &Feature, index: usize, property: &str) -> Result<f64> {
    let value = feature
        .properties
        .as_ref()
        .and_then(|props| find_property(props, property));

    let elevation = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    elevation
        .filter(|e| e.is_finite())
        .ok_or_else(|| IngestError::MissingElevation {
            feature: index,
            property: property.to_string(),
        })
}

fn parse_position(value: &Value, feature: usize) -> Result<(f64, f64)> {
    let coords = value
        .as_array()
        .ok_or_else(|| IngestError::malformed(feature, "position is not an array"))?;

    match (
        coords.first().and_then(Value::as_f64),
        coords.get(1).and_then(Value::as_f64),
    ) {
        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Ok((x, y)),
        _ => Err(IngestError::malformed(
            feature,
            "position needs two finite numbers",
        )),
    }
}

fn parse_line(value: &Value, feature: usize) -> Result<Vec<(f64, f64)>> {
    value
        .as_array()
        .ok_or_else(|| IngestError::malformed(feature, "line is not an array of positions"))?
        .iter()
        .map(|position| parse_position(position, feature))
        .collect()
}

/// Parse one FeatureCollection into raw lines. MultiLineStrings contribute
/// one line per member; features without geometry are skipped.
pub fn parse_collection(text: &str, elevation_property: &str) -> Result<Vec<RawLine>> {
    let collection: FeatureCollection = serde_json::from_str(text)?;
    let mut lines = Vec::new();

    for (index, feature) in collection.features.iter().enumerate() {
        let Some(geometry) = &feature.geometry else {
            debug!(feature = index, "Skipping feature without geometry");
            continue;
        };

        let elevation = elevation_of(feature, index, elevation_property)?;

        match geometry.kind.as_str() {
            "LineString" => lines.push(RawLine {
                elevation,
                points: parse_line(&geometry.coordinates, index)?,
            }),
            "MultiLineString" => {
                let members = geometry.coordinates.as_array().ok_or_else(|| {
                    IngestError::malformed(index, "MultiLineString is not an array of lines")
                })?;
                for member in members {
                    lines.push(RawLine {
                        elevation,
                        points: parse_line(member, index)?,
                    });
                }
            }
            other => {
                return Err(IngestError::UnsupportedGeometry {
                    feature: index,
                    kind: other.to_string(),
                })
            }
        }
    }

    Ok(lines)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Combined extent of `lines`.
pub fn compute_bounds(lines: &[RawLine]) -> SourceBounds {
    let mut bounds = SourceBounds::empty();
    for line in lines {
        bounds.include_elevation(line.elevation);
        for (x, y) in &line.points {
            bounds.include_point(*x, *y);
        }
    }
    bounds
}

/// Normalize raw lines against `bounds` and build the contour set.
///
/// Elevation ids are assigned densely in first-seen order.
pub fn normalize<P: SourcePoint>(lines: Vec<RawLine>, bounds: SourceBounds) -> Result<LoadedContours<P>> {
    let mut ids: HashMap<u64, u32> = HashMap::new();
    let mut elevations = Vec::new();
    let mut strips = Vec::with_capacity(lines.len());
    let mut dropped = 0;

    for (index, line) in lines.into_iter().enumerate() {
        if line.points.len() < 2 {
            warn!(line = index, points = line.points.len(), "Dropping line with fewer than two points");
            dropped += 1;
            continue;
        }

        if let Some(&(x, y)) = line.points.iter().find(|(x, y)| !bounds.contains(*x, *y)) {
            return Err(IngestError::OutOfBounds { x, y });
        }

        let next_id = ids.len() as u32;
        let id = *ids.entry(line.elevation.to_bits()).or_insert_with(|| {
            elevations.push(line.elevation);
            next_id
        });

        let points = line
            .points
            .iter()
            .map(|(x, y)| {
                let (nx, ny) = bounds.normalize_point(*x, *y);
                P::from_normalized(nx, ny)
            })
            .collect();

        strips.push(
            LineStrip::new(bounds.normalize_elevation(line.elevation), points).with_elevation_id(id),
        );
    }

    if strips.is_empty() {
        return Err(IngestError::NoContours);
    }

    Ok(LoadedContours {
        contours: ContourSet::new(strips),
        bounds,
        elevations,
        dropped,
    })
}

/// Load and normalize every file in `paths` as one contour set.
pub fn load_files<P: SourcePoint>(paths: &[PathBuf], options: &LoadOptions) -> Result<LoadedContours<P>> {
    let start = Instant::now();
    let mut lines = Vec::new();

    for path in paths {
        info!(path = %path.display(), "Loading GeoJSON file");
        let text = read_file(path)?;
        let parsed = parse_collection(&text, &options.elevation_property)?;
        debug!(path = %path.display(), lines = parsed.len(), "Parsed GeoJSON file");
        lines.extend(parsed);
    }

    if lines.is_empty() {
        return Err(IngestError::NoContours);
    }

    let bounds = match options.bounds {
        Some(bounds) => bounds,
        None => compute_bounds(&lines),
    };
    info!(
        min_x = bounds.min_x,
        min_y = bounds.min_y,
        max_x = bounds.max_x,
        max_y = bounds.max_y,
        min_elevation = bounds.min_elevation,
        max_elevation = bounds.max_elevation,
        "Contour bounds"
    );

    let loaded = normalize(lines, bounds)?;
    info!(
        files = paths.len(),
        strips = loaded.contours.len(),
        segments = loaded.contours.segment_count(),
        levels = loaded.elevations.len(),
        dropped = loaded.dropped,
        precision = %P::PRECISION,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Contours loaded"
    );

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contour_common::Point;

    #[test]
    fn test_property_lookup_falls_back_to_case_insensitive() {
        let props: Map<String, Value> =
            serde_json::from_str(r#"{"elevation": 5, "ELEVATION": 7}"#).unwrap();
        assert_eq!(find_property(&props, "elevation"), Some(&Value::from(5)));
        assert_eq!(find_property(&props, "ELEVATION"), Some(&Value::from(7)));

        let props: Map<String, Value> = serde_json::from_str(r#"{"contourele": 9}"#).unwrap();
        assert_eq!(find_property(&props, "ContourEle"), Some(&Value::from(9)));
    }

    #[test]
    fn test_string_elevation_accepted() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"Elevation":" 12.5 "},
             "geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]}}]}"#;
        let lines = parse_collection(text, "Elevation").unwrap();
        assert_eq!(lines[0].elevation, 12.5);
    }

    #[test]
    fn test_third_coordinate_ignored() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"Elevation":1},
             "geometry":{"type":"LineString","coordinates":[[0,0,100],[2,4,100]]}}]}"#;
        let lines = parse_collection(text, "Elevation").unwrap();
        assert_eq!(lines[0].points, vec![(0.0, 0.0), (2.0, 4.0)]);
    }

    #[test]
    fn test_missing_elevation() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"Height":1},
             "geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]}}]}"#;
        let err = parse_collection(text, "Elevation").unwrap_err();
        assert!(matches!(err, IngestError::MissingElevation { feature: 0, .. }));
    }

    #[test]
    fn test_unsupported_geometry() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"Elevation":1},
             "geometry":{"type":"Point","coordinates":[0,0]}}]}"#;
        let err = parse_collection(text, "Elevation").unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedGeometry { ref kind, .. } if kind == "Point"));
    }

    #[test]
    fn test_elevation_ids_first_seen_order() {
        let lines = vec![
            RawLine { elevation: 30.0, points: vec![(0.0, 0.0), (1.0, 0.0)] },
            RawLine { elevation: 10.0, points: vec![(0.0, 1.0), (1.0, 1.0)] },
            RawLine { elevation: 30.0, points: vec![(0.0, 0.5), (1.0, 0.5)] },
        ];
        let bounds = compute_bounds(&lines);
        let loaded: LoadedContours<Point> = normalize(lines, bounds).unwrap();

        let ids: Vec<u32> = loaded.contours.strips().iter().map(|s| s.elevation_id).collect();
        assert_eq!(ids, vec![0, 1, 0]);
        assert_eq!(loaded.elevations, vec![30.0, 10.0]);
        assert_eq!(loaded.contours.strips()[1].elevation, 0.0);
        assert_eq!(loaded.contours.strips()[0].elevation, 1.0);
    }

    #[test]
    fn test_short_lines_dropped() {
        let lines = vec![
            RawLine { elevation: 1.0, points: vec![(0.0, 0.0)] },
            RawLine { elevation: 2.0, points: vec![(0.0, 0.0), (1.0, 1.0)] },
        ];
        let bounds = compute_bounds(&lines);
        let loaded: LoadedContours<Point> = normalize(lines, bounds).unwrap();
        assert_eq!(loaded.contours.len(), 1);
        assert_eq!(loaded.dropped, 1);
    }

    #[test]
    fn test_out_of_fixed_bounds() {
        let lines = vec![RawLine { elevation: 1.0, points: vec![(0.0, 0.0), (5.0, 5.0)] }];
        let mut bounds = SourceBounds::empty();
        bounds.include_point(0.0, 0.0);
        bounds.include_point(1.0, 1.0);
        bounds.include_elevation(1.0);
        let err = normalize::<Point>(lines, bounds).unwrap_err();
        assert!(matches!(err, IngestError::OutOfBounds { x, y } if x == 5.0 && y == 5.0));
    }
}
