//! The commit protocol (spec §4.10, §9): one function taking a
//! `DownloadResult` and returning a `CommitOutcome`. Write logic is not
//! distributed across workers.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use shadow_atlas_contracts::BoundingBox;
use shadow_atlas_storage::{EventKind, NewArtifact, NewEvent, Store};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub muni_id: String,
    pub source_id: String,
    pub payload: Value,
    pub record_count: i64,
    pub bbox: Option<BoundingBox>,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub last_edit_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// The existing head's artifact already has this content hash.
    Skipped { muni_id: String, content_sha256: String },
    Committed { muni_id: String, artifact_id: Uuid, content_sha256: String },
}

/// `contentSha256 == sha256(canonicalJson(payload))` (spec §8). `serde_json`
/// serializes object keys in sorted order without the `preserve_order`
/// feature, which is exactly the canonicalization this hash needs.
pub fn canonical_content_sha256(payload: &Value) -> String {
    let canonical = serde_json::to_vec(payload).expect("serde_json::Value always serializes");
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    hex::encode(hasher.finalize())
}

/// Decides skip-vs-insert given the existing head's content hash, if any.
pub fn decide_commit(existing_content_sha256: Option<&str>, new_content_sha256: &str) -> bool {
    existing_content_sha256 != Some(new_content_sha256)
}

pub async fn commit_download(store: &Store, run_id: &str, download: DownloadResult) -> Result<CommitOutcome, shadow_atlas_storage::StorageError> {
    let lock = store.lock_for_muni(&download.muni_id);
    let _guard = lock.lock().await;

    let content_sha256 = canonical_content_sha256(&download.payload);

    let existing_sha = match store.get_head(&download.muni_id).await? {
        Some(head) => store.get_artifact(head.artifact_id).await?.map(|a| a.content_sha256),
        None => None,
    };

    if !decide_commit(existing_sha.as_deref(), &content_sha256) {
        store
            .insert_event(NewEvent {
                run_id: run_id.to_string(),
                muni_id: Some(download.muni_id.clone()),
                kind: EventKind::Skip,
                payload: serde_json::json!({"sourceId": download.source_id, "reason": "content unchanged"}),
                duration_ms: None,
                error: None,
            })
            .await?;
        return Ok(CommitOutcome::Skipped { muni_id: download.muni_id, content_sha256 });
    }

    let artifact_id = store
        .insert_artifact(NewArtifact {
            muni_id: download.muni_id.clone(),
            content_sha256: content_sha256.clone(),
            record_count: download.record_count,
            bbox: download.bbox,
            etag: download.etag.clone(),
            last_modified: download.last_modified,
            last_edit_date: download.last_edit_date,
        })
        .await?;

    store.upsert_head(&download.muni_id, artifact_id).await?;

    store
        .insert_event(NewEvent {
            run_id: run_id.to_string(),
            muni_id: Some(download.muni_id.clone()),
            kind: EventKind::Update,
            payload: serde_json::json!({"sourceId": download.source_id, "artifactId": artifact_id, "contentSha256": content_sha256}),
            duration_ms: None,
            error: None,
        })
        .await?;

    Ok(CommitOutcome::Committed { muni_id: download.muni_id, artifact_id, content_sha256 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_payloads_hash_identically_regardless_of_key_order() {
        let a = json!({"type": "FeatureCollection", "features": []});
        let b = json!({"features": [], "type": "FeatureCollection"});
        assert_eq!(canonical_content_sha256(&a), canonical_content_sha256(&b));
    }

    #[test]
    fn decide_commit_skips_on_matching_hash() {
        assert!(!decide_commit(Some("abc"), "abc"));
        assert!(decide_commit(Some("abc"), "def"));
        assert!(decide_commit(None, "def"));
    }
}
