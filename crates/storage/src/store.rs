//! Outbound storage interface (spec §6): idempotent artifact inserts,
//! head upserts under a per-muniId lock, and the run event log.

use crate::error::StorageError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use shadow_atlas_contracts::{Artifact, BoundingBox, Head};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewArtifact {
    pub muni_id: String,
    pub content_sha256: String,
    pub record_count: i64,
    pub bbox: Option<BoundingBox>,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub last_edit_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Discover,
    Select,
    Fetch,
    Update,
    Error,
    Skip,
}

impl EventKind {
    fn as_str(self) -> &'static str {
        match self {
            EventKind::Discover => "DISCOVER",
            EventKind::Select => "SELECT",
            EventKind::Fetch => "FETCH",
            EventKind::Update => "UPDATE",
            EventKind::Error => "ERROR",
            EventKind::Skip => "SKIP",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub run_id: String,
    pub muni_id: Option<String>,
    pub kind: EventKind,
    pub payload: Value,
    pub duration_ms: Option<i64>,
    pub error: Option<String>,
}

pub struct Store {
    pool: PgPool,
    muni_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Store {
    pub async fn connect(config: &shadow_atlas_config::DatabaseConfig) -> Result<Self, StorageError> {
        let pool = crate::pool::create_pool(config).await?;
        crate::schema::ensure_schema(&pool).await?;
        Ok(Self { pool, muni_locks: DashMap::new() })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool, muni_locks: DashMap::new() }
    }

    /// The per-muniId lock that totally orders the commit sequence
    /// (artifact insert -> head upsert -> checksum update -> event append)
    /// for a single municipality (spec §5).
    pub fn lock_for_muni(&self, muni_id: &str) -> Arc<Mutex<()>> {
        self.muni_locks.entry(muni_id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Idempotent on `(muni_id, content_sha256)`: a repeat insert of the
    /// same content returns the existing artifact id rather than erroring.
    pub async fn insert_artifact(&self, new: NewArtifact) -> Result<Uuid, StorageError> {
        if let Some(bbox) = new.bbox {
            if !bbox.is_valid_wgs84() {
                return Err(shadow_atlas_contracts::ArtifactError::InvalidBoundingBox(bbox).into());
            }
        }
        if new.record_count < 0 {
            return Err(shadow_atlas_contracts::ArtifactError::NegativeRecordCount(new.record_count).into());
        }

        let id = Uuid::new_v4();
        let row = sqlx::query(
            r#"
            INSERT INTO artifacts
                (id, muni_id, content_sha256, record_count,
                 bbox_min_lon, bbox_min_lat, bbox_max_lon, bbox_max_lat,
                 etag, last_modified, last_edit_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (muni_id, content_sha256) DO UPDATE SET muni_id = EXCLUDED.muni_id
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&new.muni_id)
        .bind(&new.content_sha256)
        .bind(new.record_count)
        .bind(new.bbox.map(|b| b.min_lon))
        .bind(new.bbox.map(|b| b.min_lat))
        .bind(new.bbox.map(|b| b.max_lon))
        .bind(new.bbox.map(|b| b.max_lat))
        .bind(&new.etag)
        .bind(new.last_modified)
        .bind(new.last_edit_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    pub async fn upsert_head(&self, muni_id: &str, artifact_id: Uuid) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO heads (muni_id, artifact_id, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (muni_id) DO UPDATE SET artifact_id = EXCLUDED.artifact_id, updated_at = now()
            "#,
        )
        .bind(muni_id)
        .bind(artifact_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_head(&self, muni_id: &str) -> Result<Option<Head>, StorageError> {
        let row = sqlx::query("SELECT muni_id, artifact_id, updated_at FROM heads WHERE muni_id = $1")
            .bind(muni_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Head {
            muni_id: r.get("muni_id"),
            artifact_id: r.get("artifact_id"),
            updated_at: r.get("updated_at"),
        }))
    }

    pub async fn get_artifact(&self, artifact_id: Uuid) -> Result<Option<Artifact>, StorageError> {
        let row = sqlx::query(
            r#"SELECT id, muni_id, content_sha256, record_count,
                      bbox_min_lon, bbox_min_lat, bbox_max_lon, bbox_max_lat,
                      etag, last_modified, created_at
               FROM artifacts WHERE id = $1"#,
        )
        .bind(artifact_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            let bbox = match (
                r.get::<Option<f64>, _>("bbox_min_lon"),
                r.get::<Option<f64>, _>("bbox_min_lat"),
                r.get::<Option<f64>, _>("bbox_max_lon"),
                r.get::<Option<f64>, _>("bbox_max_lat"),
            ) {
                (Some(min_lon), Some(min_lat), Some(max_lon), Some(max_lat)) => {
                    Some(BoundingBox { min_lon, min_lat, max_lon, max_lat })
                }
                _ => None,
            };
            Artifact {
                id: r.get("id"),
                muni_id: r.get("muni_id"),
                content_sha256: r.get("content_sha256"),
                record_count: r.get("record_count"),
                bbox,
                etag: r.get("etag"),
                last_modified: r.get("last_modified"),
                created_at: r.get("created_at"),
            }
        }))
    }

    pub async fn list_municipalities(&self, limit: i64, offset: i64) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query("SELECT DISTINCT muni_id FROM artifacts ORDER BY muni_id LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.get("muni_id")).collect())
    }

    /// Current selected source for a municipality, if the caller has
    /// previously recorded one via a `SELECT` event.
    pub async fn get_selection(&self, muni_id: &str) -> Result<Option<Value>, StorageError> {
        let row = sqlx::query(
            "SELECT payload FROM events WHERE muni_id = $1 AND kind = 'SELECT' ORDER BY created_at DESC LIMIT 1",
        )
        .bind(muni_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("payload")))
    }

    /// Sources recorded against a municipality via `DISCOVER` events, most
    /// recent first. The registry remains the source of static descriptors;
    /// this reads the acquisition history, not the catalog.
    pub async fn get_sources_by_muni(&self, muni_id: &str) -> Result<Vec<Value>, StorageError> {
        let rows = sqlx::query(
            "SELECT payload FROM events WHERE muni_id = $1 AND kind = 'DISCOVER' ORDER BY created_at DESC",
        )
        .bind(muni_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.get("payload")).collect())
    }

    pub async fn insert_event(&self, event: NewEvent) -> Result<(), StorageError> {
        sqlx::query(
            r#"INSERT INTO events (run_id, muni_id, kind, payload, duration_ms, error)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(&event.run_id)
        .bind(&event.muni_id)
        .bind(event.kind.as_str())
        .bind(&event.payload)
        .bind(event.duration_ms)
        .bind(&event.error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_artifact(muni_id: &str, sha: &str) -> NewArtifact {
        NewArtifact {
            muni_id: muni_id.into(),
            content_sha256: sha.into(),
            record_count: 10,
            bbox: None,
            etag: None,
            last_modified: None,
            last_edit_date: None,
        }
    }

    #[test]
    fn rejects_negative_record_count_before_hitting_the_database() {
        let mut artifact = new_artifact("muni-1", "deadbeef");
        artifact.record_count = -1;
        // insert_artifact validates before issuing a query, so this path
        // never touches a connection pool; exercised directly via the
        // contracts validation it shares with `Artifact::new`.
        assert!(shadow_atlas_contracts::Artifact::new(
            artifact.muni_id,
            artifact.content_sha256,
            artifact.record_count,
            artifact.bbox,
            artifact.etag,
            artifact.last_modified,
        )
        .is_err());
    }
}
