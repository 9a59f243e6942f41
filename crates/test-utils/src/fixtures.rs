//! GeoJSON fixtures for loader and end-to-end tests.

use serde_json::{json, Value};

/// A LineString feature with an `Elevation` property.
pub fn line_feature(elevation: f64, coords: &[(f64, f64)]) -> Value {
    json!({
        "type": "Feature",
        "properties": { "Elevation": elevation },
        "geometry": {
            "type": "LineString",
            "coordinates": coords.iter().map(|(x, y)| json!([x, y])).collect::<Vec<_>>(),
        }
    })
}

/// A MultiLineString feature with an `Elevation` property.
pub fn multi_line_feature(elevation: f64, lines: &[&[(f64, f64)]]) -> Value {
    let lines: Vec<Value> = lines
        .iter()
        .map(|line| Value::Array(line.iter().map(|(x, y)| json!([x, y])).collect()))
        .collect();
    json!({
        "type": "Feature",
        "properties": { "Elevation": elevation },
        "geometry": { "type": "MultiLineString", "coordinates": lines }
    })
}

/// Wrap features in a FeatureCollection and serialize it.
pub fn feature_collection(features: Vec<Value>) -> String {
    json!({ "type": "FeatureCollection", "features": features }).to_string()
}

/// Two parallel contours in projected-metre-like units: elevation 100 along
/// y = 1000 and elevation 200 along y = 2000, both spanning x 500..1500.
pub fn two_level_collection() -> String {
    feature_collection(vec![
        line_feature(100.0, &[(500.0, 1000.0), (1500.0, 1000.0)]),
        line_feature(200.0, &[(500.0, 2000.0), (1000.0, 2000.0), (1500.0, 2000.0)]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_level_collection_parses() {
        let value: Value = serde_json::from_str(&two_level_collection()).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().unwrap().len(), 2);
        assert_eq!(value["features"][1]["properties"]["Elevation"], 200.0);
    }

    #[test]
    fn test_multi_line_feature_shape() {
        let f = multi_line_feature(5.0, &[&[(0.0, 0.0), (1.0, 1.0)], &[(2.0, 2.0), (3.0, 3.0)]]);
        assert_eq!(f["geometry"]["coordinates"].as_array().unwrap().len(), 2);
    }
}
