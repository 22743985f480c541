//! Content-addressed artifact and the mutable head pointer that selects one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bounding box in WGS84 degrees: `(min_lon, min_lat, max_lon, max_lat)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn is_valid_wgs84(&self) -> bool {
        (-180.0..=180.0).contains(&self.min_lon)
            && (-180.0..=180.0).contains(&self.max_lon)
            && (-90.0..=90.0).contains(&self.min_lat)
            && (-90.0..=90.0).contains(&self.max_lat)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("bounding box out of WGS84 range: {0:?}")]
    InvalidBoundingBox(BoundingBox),
    #[error("recordCount must be >= 0, got {0}")]
    NegativeRecordCount(i64),
}

/// Immutable, content-addressed blob (spec §3). Artifacts are never
/// mutated after insert — a changed dataset is a new artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Uuid,
    pub muni_id: String,
    pub content_sha256: String,
    pub record_count: i64,
    pub bbox: Option<BoundingBox>,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(
        muni_id: impl Into<String>,
        content_sha256: impl Into<String>,
        record_count: i64,
        bbox: Option<BoundingBox>,
        etag: Option<String>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Result<Self, ArtifactError> {
        if record_count < 0 {
            return Err(ArtifactError::NegativeRecordCount(record_count));
        }
        if let Some(b) = bbox {
            if !b.is_valid_wgs84() {
                return Err(ArtifactError::InvalidBoundingBox(b));
            }
        }
        Ok(Self {
            id: Uuid::new_v4(),
            muni_id: muni_id.into(),
            content_sha256: content_sha256.into(),
            record_count,
            bbox,
            etag,
            last_modified,
            created_at: Utc::now(),
        })
    }
}

/// Mutable pointer: exactly zero or one head per `muni_id`. Updating it is
/// the commit point for a boundary refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Head {
    pub muni_id: String,
    pub artifact_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_bbox() {
        let bad = BoundingBox { min_lon: -200.0, min_lat: 0.0, max_lon: 10.0, max_lat: 10.0 };
        let err = Artifact::new("muni-1", "deadbeef", 10, Some(bad), None, None).unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidBoundingBox(_)));
    }

    #[test]
    fn rejects_negative_record_count() {
        let err = Artifact::new("muni-1", "deadbeef", -1, None, None, None).unwrap_err();
        assert!(matches!(err, ArtifactError::NegativeRecordCount(-1)));
    }

    #[test]
    fn accepts_valid_artifact() {
        let bbox = BoundingBox { min_lon: -120.0, min_lat: 30.0, max_lon: -119.0, max_lat: 31.0 };
        let artifact = Artifact::new("muni-1", "deadbeef", 10, Some(bbox), None, None).unwrap();
        assert_eq!(artifact.record_count, 10);
    }
}
