//! The incremental/full/force run modes (spec §4.10) and the per-source
//! state machine: `Scheduled -> HeadCheck -> {Unchanged|Changed} -> Download
//! -> Validate -> {Rejected|Reviewed|Resolve} -> Commit -> Done`.

use crate::commit::{commit_download, CommitOutcome, DownloadResult};
use crate::run_id::generate_run_id;
use crate::sources::SourceTracker;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use shadow_atlas_change_detector::detect_changes_with_freshness;
use shadow_atlas_conflict_resolver::resolve_conflict;
use shadow_atlas_contracts::{AcquisitionError, AuthorityLevel, BoundaryType, Jurisdiction, SourceClaim, SourceKind};
use shadow_atlas_freshness::comparator::PrimarySourceComparator;
use shadow_atlas_freshness::gap::GapDetector;
use shadow_atlas_registry::SourceRegistry;
use shadow_atlas_storage::{EventKind, NewEvent, Store};
use shadow_atlas_validator::{validate, ValidationConfig};
use std::sync::atomic::{AtomicUsize, Ordering};

/// What a worker returns for one source, before validation/resolution.
#[derive(Debug, Clone)]
pub struct RawDownload {
    pub payload: Value,
    pub source_name: String,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<RawDownload, AcquisitionError>;
}

/// `extractMuniId` is a pass-through in the source this was distilled from
/// (spec §9 Open Questions) — the mapping from sourceId to muniId belongs
/// to the registry/storage layer, not the orchestrator. Callers needing a
/// real mapping provide their own `MuniIdMapper`.
pub trait MuniIdMapper: Send + Sync {
    fn muni_id_for(&self, source_id: &str) -> String;
}

pub struct PassThroughMuniIdMapper;
impl MuniIdMapper for PassThroughMuniIdMapper {
    fn muni_id_for(&self, source_id: &str) -> String {
        source_id.to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunError {
    pub source_id: String,
    pub error: String,
    pub recoverable: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IncrementalReport {
    pub sources_checked: usize,
    pub sources_changed: usize,
    pub boundaries_updated: Vec<String>,
    pub errors: Vec<RunError>,
    pub duration_ms: u64,
    pub run_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FullSnapshotReport {
    pub municipalities_processed: usize,
    pub boundaries_updated: Vec<String>,
    pub errors: Vec<RunError>,
    pub duration_ms: u64,
    pub run_id: String,
    pub snapshot_hash: String,
}

pub struct Orchestrator<'a> {
    pub registry: &'a SourceRegistry,
    pub comparator: &'a PrimarySourceComparator,
    pub gap_detector: &'a GapDetector,
    pub store: &'a Store,
    pub downloader: &'a dyn Downloader,
    pub muni_mapper: &'a dyn MuniIdMapper,
    pub tracker: &'a SourceTracker,
    pub max_concurrent_downloads: usize,
}

impl<'a> Orchestrator<'a> {
    /// Primary mode (~$0): scheduled change detection, bounded-concurrency
    /// download, validate, resolve, commit.
    pub async fn run_incremental_refresh(&self, scopes: &[(BoundaryType, Jurisdiction)]) -> IncrementalReport {
        self.run(scopes, false).await
    }

    /// Operator escape hatch: identical to incremental but every tracked
    /// source is treated as a download candidate regardless of its
    /// freshness assessment.
    pub async fn force_check_all(&self, scopes: &[(BoundaryType, Jurisdiction)]) -> IncrementalReport {
        self.run(scopes, true).await
    }

    async fn run(&self, scopes: &[(BoundaryType, Jurisdiction)], force: bool) -> IncrementalReport {
        let start = std::time::Instant::now();
        let run_id = generate_run_id(Utc::now());

        let mut report = IncrementalReport { run_id: run_id.clone(), ..Default::default() };
        let checked = AtomicUsize::new(0);
        let changed = AtomicUsize::new(0);

        for (boundary_type, jurisdiction) in scopes {
            let sources = self.tracker.sources_for(self.registry, *boundary_type, jurisdiction);
            checked.fetch_add(sources.len(), Ordering::Relaxed);

            let assessments = detect_changes_with_freshness(self.comparator, self.registry, self.gap_detector, *boundary_type, jurisdiction, &sources).await;

            let candidates: Vec<_> = sources
                .iter()
                .zip(assessments.iter())
                .filter(|(_, assessment)| force || assessment.has_changed)
                .collect();
            changed.fetch_add(candidates.len(), Ordering::Relaxed);

            let outcomes = futures::future::join_all(candidates.into_iter().map(|(source, assessment)| {
                let run_id = run_id.clone();
                async move {
                    let authority = self.registry.get_authority(*boundary_type).ok();
                    let descriptor = authority.and_then(|entry| {
                        entry.primary_sources.iter().chain(entry.aggregator_sources.iter()).find(|d| d.id == source.id)
                    });
                    let kind = descriptor.map(|d| d.kind).unwrap_or(SourceKind::Aggregator);
                    let authority_level = descriptor.map(|d| d.authority_level).unwrap_or(AuthorityLevel::UNKNOWN);

                    self.process_changed_source(&run_id, source, assessment.confidence, kind, authority_level).await
                }
            }))
            .await;

            for outcome in outcomes {
                match outcome {
                    SourceOutcome::Updated { muni_id } => report.boundaries_updated.push(muni_id),
                    SourceOutcome::Unchanged => {}
                    SourceOutcome::Skipped { source_id } => tracing::debug!(source_id, "validation rejected payload, skipping commit"),
                    SourceOutcome::Error { source_id, error, recoverable } => {
                        report.errors.push(RunError { source_id, error, recoverable, timestamp: Utc::now() });
                    }
                }
            }
        }

        report.sources_checked = checked.into_inner();
        report.sources_changed = changed.into_inner();
        report.duration_ms = start.elapsed().as_millis() as u64;
        report
    }

    async fn process_changed_source(
        &self,
        run_id: &str,
        source: &shadow_atlas_contracts::CanonicalSource,
        confidence: f64,
        kind: SourceKind,
        authority_level: AuthorityLevel,
    ) -> SourceOutcome {
        let raw = match self.downloader.download(&source.url).await {
            Ok(raw) => raw,
            Err(error) => {
                let _ = self
                    .store
                    .insert_event(NewEvent {
                        run_id: run_id.to_string(),
                        muni_id: None,
                        kind: EventKind::Error,
                        payload: serde_json::json!({"sourceId": source.id}),
                        duration_ms: None,
                        error: Some(error.to_string()),
                    })
                    .await;
                return SourceOutcome::Error { source_id: source.id.clone(), error: error.to_string(), recoverable: error.is_recoverable() };
            }
        };

        let validation = validate(&raw.payload, &ValidationConfig::default());
        if !validation.valid {
            let muni_id = self.muni_mapper.muni_id_for(&source.id);
            let _ = self
                .store
                .insert_event(NewEvent {
                    run_id: run_id.to_string(),
                    muni_id: Some(muni_id),
                    kind: EventKind::Skip,
                    payload: serde_json::json!({"sourceId": source.id, "issues": validation.issues}),
                    duration_ms: None,
                    error: None,
                })
                .await;
            return SourceOutcome::Skipped { source_id: source.id.clone() };
        }

        let claim = SourceClaim {
            source_id: source.id.clone(),
            source_name: raw.source_name.clone(),
            boundary: source.id.clone(),
            last_modified: raw.last_modified.unwrap_or_else(Utc::now),
            kind,
            authority_level,
            etag: raw.etag.clone(),
            version: None,
        };
        let muni_id = self.muni_mapper.muni_id_for(&source.id);
        // A single claim always resolves trivially; multi-claim resolution
        // applies once more than one source targets the same muniId, which
        // this per-source pipeline does not yet batch together.
        if let Err(error) = resolve_conflict(&muni_id, vec![claim]) {
            return SourceOutcome::Error { source_id: source.id.clone(), error: error.to_string(), recoverable: false };
        }
        let _ = confidence;

        let download = DownloadResult {
            muni_id: muni_id.clone(),
            source_id: source.id.clone(),
            payload: raw.payload,
            record_count: validation.metadata.feature_count as i64,
            bbox: validation.metadata.bounding_box,
            etag: raw.etag.clone(),
            last_modified: raw.last_modified,
            last_edit_date: None,
        };

        match commit_download(self.store, run_id, download).await {
            Ok(CommitOutcome::Committed { muni_id, .. }) => {
                self.tracker.mark_checked(&source.id, raw.etag.or_else(|| raw.last_modified.map(|d| d.to_rfc3339())));
                SourceOutcome::Updated { muni_id }
            }
            Ok(CommitOutcome::Skipped { .. }) => {
                self.tracker.mark_checked(&source.id, raw.etag);
                SourceOutcome::Unchanged
            }
            Err(error) => SourceOutcome::Error { source_id: source.id.clone(), error: error.to_string(), recoverable: false },
        }
    }

    /// Quarterly mode: iterate every tracked municipality via its current
    /// selected source, compute hash+bbox, insert artifact, upsert head.
    pub async fn run_full_snapshot(&self, batch_size: i64) -> Result<FullSnapshotReport, shadow_atlas_storage::StorageError> {
        let start = std::time::Instant::now();
        let run_id = generate_run_id(Utc::now());
        let mut report = FullSnapshotReport {
            municipalities_processed: 0,
            boundaries_updated: Vec::new(),
            errors: Vec::new(),
            duration_ms: 0,
            run_id: run_id.clone(),
            snapshot_hash: String::new(),
        };

        let mut offset = 0i64;
        let mut all_muni_ids: Vec<String> = Vec::new();
        loop {
            let batch = self.store.list_municipalities(batch_size, offset).await?;
            if batch.is_empty() {
                break;
            }
            for muni_id in &batch {
                report.municipalities_processed += 1;
                all_muni_ids.push(muni_id.clone());

                let Some(selection) = self.store.get_selection(muni_id).await? else {
                    continue;
                };
                let Some(url) = selection.get("url").and_then(Value::as_str) else {
                    continue;
                };

                match self.downloader.download(url).await {
                    Ok(raw) => {
                        let validation = validate(&raw.payload, &ValidationConfig::default());
                        let download = DownloadResult {
                            muni_id: muni_id.clone(),
                            source_id: selection.get("sourceId").and_then(Value::as_str).unwrap_or(muni_id).to_string(),
                            payload: raw.payload,
                            record_count: validation.metadata.feature_count as i64,
                            bbox: validation.metadata.bounding_box,
                            etag: raw.etag,
                            last_modified: raw.last_modified,
                            last_edit_date: None,
                        };
                        if let Ok(CommitOutcome::Committed { muni_id, .. }) = commit_download(self.store, &run_id, download).await {
                            report.boundaries_updated.push(muni_id);
                        }
                    }
                    Err(error) => {
                        report.errors.push(RunError { source_id: muni_id.clone(), error: error.to_string(), recoverable: error.is_recoverable(), timestamp: Utc::now() });
                    }
                }
            }
            offset += batch_size;
        }

        report.snapshot_hash = snapshot_hash(&all_muni_ids);
        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }
}

/// SHA-256 of the sorted, comma-joined municipality ids (spec §4.10).
pub fn snapshot_hash(muni_ids: &[String]) -> String {
    let mut sorted = muni_ids.to_vec();
    sorted.sort();
    sorted.dedup();
    let mut hasher = Sha256::new();
    hasher.update(sorted.join(",").as_bytes());
    hex::encode(hasher.finalize())
}

enum SourceOutcome {
    Updated { muni_id: String },
    Unchanged,
    Skipped { source_id: String },
    Error { source_id: String, error: String, recoverable: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_hash_is_stable_under_input_reordering() {
        let a = vec!["muni-b".to_string(), "muni-a".to_string()];
        let b = vec!["muni-a".to_string(), "muni-b".to_string()];
        assert_eq!(snapshot_hash(&a), snapshot_hash(&b));
    }

    #[test]
    fn snapshot_hash_changes_with_membership() {
        let a = vec!["muni-a".to_string()];
        let b = vec!["muni-a".to_string(), "muni-b".to_string()];
        assert_ne!(snapshot_hash(&a), snapshot_hash(&b));
    }
}
