//! Builds the per-dataset provenance envelope a worker attaches to a
//! successfully scraped payload (spec §4.9). Workers return this
//! in-memory; they never write it to the append-only log themselves — the
//! orchestrator does that after validation and conflict resolution run.

use crate::contract::{DatasetProvenance, GeometryType, ValidationSummary};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};

pub fn response_sha256(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}

/// Majority geometry type across a FeatureCollection's features, defaulting
/// to `Polygon` when no geometries are present (a worker payload with no
/// features is a validator concern, not a provenance concern).
pub fn dominant_geometry_type(payload: &Value) -> GeometryType {
    let multi = payload
        .get("features")
        .and_then(Value::as_array)
        .map(|features| {
            features
                .iter()
                .filter(|f| f.get("geometry").and_then(|g| g.get("type")).and_then(Value::as_str) == Some("MultiPolygon"))
                .count()
        })
        .unwrap_or(0);
    let total = payload.get("features").and_then(Value::as_array).map(|f| f.len()).unwrap_or(0);
    if total > 0 && multi * 2 >= total {
        GeometryType::MultiPolygon
    } else {
        GeometryType::Polygon
    }
}

pub fn feature_count(payload: &Value) -> u64 {
    payload.get("features").and_then(Value::as_array).map(|f| f.len() as u64).unwrap_or(0)
}

#[allow(clippy::too_many_arguments)]
pub fn build(
    source: &str,
    authority: &str,
    jurisdiction: &str,
    method: &str,
    body: &[u8],
    payload: &Value,
    http_status: u16,
    source_last_modified: Option<DateTime<Utc>>,
    license: Option<String>,
) -> DatasetProvenance {
    DatasetProvenance {
        source: source.to_string(),
        authority: authority.to_string(),
        jurisdiction: jurisdiction.to_string(),
        timestamp: Utc::now(),
        source_last_modified,
        method: method.to_string(),
        response_sha256: response_sha256(body),
        http_status,
        license,
        feature_count: feature_count(payload),
        geometry_type: dominant_geometry_type(payload),
        coordinate_system: "EPSG:4326".to_string(),
        validation: ValidationSummary { confidence: 0, issues: Vec::new(), warnings: Vec::new(), timestamp: Utc::now() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dominant_geometry_defaults_to_polygon_when_empty() {
        let payload = json!({"type": "FeatureCollection", "features": []});
        assert_eq!(dominant_geometry_type(&payload), GeometryType::Polygon);
    }

    #[test]
    fn majority_multipolygon_wins() {
        let payload = json!({
            "type": "FeatureCollection",
            "features": [
                {"geometry": {"type": "MultiPolygon"}},
                {"geometry": {"type": "MultiPolygon"}},
                {"geometry": {"type": "Polygon"}},
            ]
        });
        assert_eq!(dominant_geometry_type(&payload), GeometryType::MultiPolygon);
    }

    #[test]
    fn sha256_is_stable_for_identical_bytes() {
        assert_eq!(response_sha256(b"hello"), response_sha256(b"hello"));
        assert_ne!(response_sha256(b"hello"), response_sha256(b"world"));
    }
}
