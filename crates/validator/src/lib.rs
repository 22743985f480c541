//! Post-download Validator (spec §4.7): structural and semantic validation
//! of an untrusted payload purporting to be a GeoJSON FeatureCollection,
//! producing a confidence score and an accept/review/reject route.

use regex::Regex;
use serde_json::Value;
use shadow_atlas_contracts::BoundingBox;
use std::collections::BTreeSet;

/// Property keys that leak individually-identifying or overly granular
/// civic data that Shadow Atlas does not ingest (spec §4.7).
const BAD_PROPERTY_PATTERN: &str = r"(?i)(precinct|parcel|lot|voting|polling|canopy|zoning)";
/// Property keys that suggest a legitimate district-style boundary.
const DISTRICT_PROPERTY_PATTERN: &str = r"(?i)(district|ward|council|member|representative)";

fn bad_property_regex() -> Regex {
    Regex::new(BAD_PROPERTY_PATTERN).expect("static pattern is valid")
}

fn district_property_regex() -> Regex {
    Regex::new(DISTRICT_PROPERTY_PATTERN).expect("static pattern is valid")
}

#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub min_features: usize,
    pub max_features: usize,
    pub require_polygons: bool,
    pub strict_bounds: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { min_features: 1, max_features: 100, require_polygons: true, strict_bounds: true }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationMetadata {
    pub feature_count: usize,
    pub geometry_types: Vec<String>,
    pub property_keys: Vec<String>,
    pub bounding_box: Option<BoundingBox>,
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub valid: bool,
    /// 0-100.
    pub confidence: u8,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub metadata: ValidationMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Reject,
    Review,
    Accept,
}

/// <60 reject, 60-84 review, >=85 accept.
pub fn route_for(confidence: u8) -> Route {
    match confidence {
        0..=59 => Route::Reject,
        60..=84 => Route::Review,
        _ => Route::Accept,
    }
}

pub fn validate(payload: &Value, config: &ValidationConfig) -> ValidationResult {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    let features = match payload.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => payload.get("features").and_then(Value::as_array),
        _ => None,
    };

    let features = match features {
        Some(features) => features,
        None => {
            issues.push("payload is not a FeatureCollection".to_string());
            return finish(issues, warnings, ValidationMetadata::default());
        }
    };

    let feature_count = features.len();
    if feature_count < config.min_features {
        issues.push(format!("feature count {feature_count} is below the minimum of {}", config.min_features));
    }
    if feature_count > config.max_features {
        issues.push(format!("feature count {feature_count} exceeds the maximum of {}", config.max_features));
    }

    let mut geometry_types: Vec<String> = Vec::new();
    let mut property_keys: BTreeSet<String> = BTreeSet::new();
    let mut coords: Vec<(f64, f64)> = Vec::new();
    let mut missing_geometry = false;
    let mut bad_property_hits: BTreeSet<String> = BTreeSet::new();
    let mut ring_issues: Vec<String> = Vec::new();

    let bad_re = bad_property_regex();
    let district_re = district_property_regex();

    for feature in features {
        let geometry = feature.get("geometry").filter(|g| !g.is_null());
        match geometry {
            None => missing_geometry = true,
            Some(geometry) => {
                if let Some(kind) = geometry.get("type").and_then(Value::as_str) {
                    if !geometry_types.iter().any(|g| g == kind) {
                        geometry_types.push(kind.to_string());
                    }
                    if let Some(coordinates) = geometry.get("coordinates") {
                        collect_points(coordinates, &mut coords);
                        if kind == "Polygon" || kind == "MultiPolygon" {
                            check_rings(kind, coordinates, &mut ring_issues);
                        }
                    }
                }
            }
        }

        if let Some(properties) = feature.get("properties").and_then(Value::as_object) {
            for key in properties.keys() {
                property_keys.insert(key.clone());
                if bad_re.is_match(key) {
                    bad_property_hits.insert(key.clone());
                }
            }
        }
    }

    if config.require_polygons && missing_geometry {
        issues.push("one or more features has no geometry, but polygons are required".to_string());
    }
    if !bad_property_hits.is_empty() {
        issues.push(format!(
            "property key(s) leak finer-grained civic data than Shadow Atlas ingests: {}",
            bad_property_hits.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }

    let bbox = bounding_box_of(&coords);
    if config.strict_bounds {
        if let Some(bbox) = bbox {
            if !bbox.is_valid_wgs84() {
                issues.push("one or more coordinates fall outside the WGS84 range".to_string());
            }
        }
    }

    warnings.extend(ring_issues);

    let all_polygons = !geometry_types.is_empty() && geometry_types.iter().all(|g| is_polygon_like(g));
    if geometry_types.len() > 1 && !all_polygons {
        warnings.push("mixed geometry types include non-polygon geometry".to_string());
    }

    let has_district_property = property_keys.iter().any(|k| district_re.is_match(k));
    if !has_district_property {
        warnings.push("no property key suggests a district-style boundary".to_string());
    }

    if let Some(bbox) = bbox {
        let lon_span = (bbox.max_lon - bbox.min_lon).abs();
        let lat_span = (bbox.max_lat - bbox.min_lat).abs();
        if lon_span > 10.0 || lat_span > 10.0 {
            warnings.push("bounding box spans more than 10 degrees on an axis".to_string());
        }
        if lon_span < 0.001 || lat_span < 0.001 {
            warnings.push("bounding box spans less than 0.001 degrees on an axis".to_string());
        }
    }

    let mut confidence: i32 = 100;
    confidence -= 50 * issues.len() as i32;
    confidence -= 5 * warnings.len() as i32;

    if issues.is_empty() {
        if has_district_property {
            confidence += 10;
        }
        if all_polygons {
            confidence += 10;
        }
        if (3..=50).contains(&feature_count) {
            confidence += 10;
        }
    }

    let confidence = confidence.clamp(0, 100) as u8;
    let metadata = ValidationMetadata {
        feature_count,
        geometry_types,
        property_keys: property_keys.into_iter().collect(),
        bounding_box: bbox,
    };

    ValidationResult { valid: confidence >= 60, confidence, issues, warnings, metadata }
}

fn finish(issues: Vec<String>, warnings: Vec<String>, metadata: ValidationMetadata) -> ValidationResult {
    ValidationResult { valid: false, confidence: 0, issues, warnings, metadata }
}

fn is_polygon_like(kind: &str) -> bool {
    kind == "Polygon" || kind == "MultiPolygon"
}

fn collect_points(value: &Value, out: &mut Vec<(f64, f64)>) {
    if let Some(arr) = value.as_array() {
        let is_leaf_point = arr.len() >= 2 && arr.iter().all(Value::is_number);
        if is_leaf_point {
            if let (Some(lon), Some(lat)) = (arr[0].as_f64(), arr[1].as_f64()) {
                out.push((lon, lat));
            }
        } else {
            for item in arr {
                collect_points(item, out);
            }
        }
    }
}

fn extract_ring(ring: &Value) -> Vec<(f64, f64)> {
    ring.as_array()
        .map(|points| {
            points
                .iter()
                .filter_map(|p| {
                    let arr = p.as_array()?;
                    Some((arr.first()?.as_f64()?, arr.get(1)?.as_f64()?))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn check_rings(kind: &str, coordinates: &Value, warnings: &mut Vec<String>) {
    let ring_lists: Vec<Vec<(f64, f64)>> = match kind {
        "Polygon" => coordinates.as_array().map(|rs| rs.iter().map(extract_ring).collect()).unwrap_or_default(),
        "MultiPolygon" => coordinates
            .as_array()
            .map(|polys| {
                polys
                    .iter()
                    .flat_map(|poly| poly.as_array().map(|rs| rs.iter().map(extract_ring).collect::<Vec<_>>()).unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    for ring in ring_lists {
        if ring.is_empty() {
            warnings.push("polygon ring is empty".to_string());
            continue;
        }
        if ring.len() < 4 {
            warnings.push(format!("polygon ring has only {} vertices (minimum 4 for a closed ring)", ring.len()));
        }
        if ring.first() != ring.last() {
            warnings.push("polygon ring is not closed (first vertex != last vertex)".to_string());
        }
    }
}

fn bounding_box_of(coords: &[(f64, f64)]) -> Option<BoundingBox> {
    let mut iter = coords.iter();
    let first = *iter.next()?;
    let mut bbox = BoundingBox { min_lon: first.0, min_lat: first.1, max_lon: first.0, max_lat: first.1 };
    for &(lon, lat) in iter {
        bbox.min_lon = bbox.min_lon.min(lon);
        bbox.max_lon = bbox.max_lon.max(lon);
        bbox.min_lat = bbox.min_lat.min(lat);
        bbox.max_lat = bbox.max_lat.max(lat);
    }
    Some(bbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square_polygon_feature(properties: Value) -> Value {
        json!({
            "type": "Feature",
            "properties": properties,
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]]
            }
        })
    }

    fn collection(features: Vec<Value>) -> Value {
        json!({ "type": "FeatureCollection", "features": features })
    }

    #[test]
    fn rejects_non_feature_collection() {
        let result = validate(&json!({"type": "Feature"}), &ValidationConfig::default());
        assert!(!result.valid);
        assert_eq!(result.confidence, 0);
    }

    #[test]
    fn accepts_clean_district_polygon() {
        let payload = collection(vec![square_polygon_feature(json!({"district": "5", "ward": "A"}))]);
        let result = validate(&payload, &ValidationConfig::default());
        assert_eq!(result.metadata.feature_count, 1);
        assert!(result.issues.is_empty());
        assert!(result.confidence >= 85, "confidence was {}", result.confidence);
        assert_eq!(route_for(result.confidence), Route::Accept);
    }

    #[test]
    fn bad_property_key_is_a_hard_issue_and_fails_validity() {
        let payload = collection(vec![square_polygon_feature(json!({"precinct_id": "42"}))]);
        let result = validate(&payload, &ValidationConfig::default());
        assert!(!result.valid);
        assert!(result.confidence < 60);
        assert_eq!(route_for(result.confidence), Route::Reject);
    }

    #[test]
    fn missing_geometry_is_a_hard_issue_when_polygons_required() {
        let feature = json!({"type": "Feature", "properties": {}, "geometry": null});
        let payload = collection(vec![feature]);
        let result = validate(&payload, &ValidationConfig::default());
        assert!(!result.issues.is_empty());
    }

    #[test]
    fn non_closed_ring_produces_a_warning() {
        let feature = json!({
            "type": "Feature",
            "properties": {"district": "1"},
            "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]]]}
        });
        let result = validate(&collection(vec![feature]), &ValidationConfig::default());
        assert!(result.warnings.iter().any(|w| w.contains("not closed")));
    }

    #[test]
    fn route_thresholds_match_spec() {
        assert_eq!(route_for(59), Route::Reject);
        assert_eq!(route_for(60), Route::Review);
        assert_eq!(route_for(84), Route::Review);
        assert_eq!(route_for(85), Route::Accept);
    }
}
