//! The provenance writer: standard per-shard-locked appends, staging-mode
//! per-agent appends, and the background merge between them (spec §4.8).

use dashmap::DashMap;
use shadow_atlas_contracts::CompactDiscoveryEntry;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::merge::MergeReport;
use crate::query::{ProvenanceQuery, ProvenanceStats};
use crate::shard::{self, shard_key};
use crate::ProvenanceError;

/// Where to append an entry: the shared shard (contended, lock-serialized)
/// or a per-agent staging file (contention-free, merged later).
#[derive(Debug, Clone)]
pub enum WriteMode {
    Standard,
    Staging { agent_id: String },
}

pub struct ProvenanceWriter {
    root: PathBuf,
    shard_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ProvenanceWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), shard_locks: DashMap::new() }
    }

    fn lock_for(&self, shard: &str) -> Arc<Mutex<()>> {
        self.shard_locks.entry(shard.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Appends one entry. In `Standard` mode the shard lock is held for the
    /// duration of the compressed write; in `Staging` mode the agent's file
    /// is exclusive to that agent so no lock is needed.
    pub async fn append(&self, entry: &CompactDiscoveryEntry, mode: WriteMode) -> Result<(), ProvenanceError> {
        match mode {
            WriteMode::Standard => {
                let shard = shard_key(entry);
                let lock = self.lock_for(&shard);
                let _guard = lock.lock().await;
                let path = shard::standard_shard_path(&self.root, &shard);
                let entry = entry.clone();
                tokio::task::spawn_blocking(move || shard::append_gz_frame(&path, &entry))
                    .await
                    .map_err(|e| ProvenanceError::Join(e.to_string()))??;
                Ok(())
            }
            WriteMode::Staging { agent_id } => {
                let path = shard::staging_path(&self.root, &agent_id);
                let entry = entry.clone();
                tokio::task::spawn_blocking(move || shard::append_plain_line(&path, &entry))
                    .await
                    .map_err(|e| ProvenanceError::Join(e.to_string()))??;
                Ok(())
            }
        }
    }

    /// Merges every staging file into its canonical shard. Idempotent:
    /// entries already present in the shard (by `(agentId, timestamp,
    /// sourceId)`) are skipped rather than duplicated.
    pub async fn merge_staging_files(&self) -> Result<MergeReport, ProvenanceError> {
        let staging_dir = self.root.join("staging");
        if !staging_dir.exists() {
            return Ok(MergeReport::default());
        }
        let mut report = MergeReport::default();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&staging_dir)? {
            let entry = entry?;
            if entry.path().extension().map(|e| e == "ndjson").unwrap_or(false) {
                files.push(entry.path());
            }
        }

        for file in files {
            let pending = match shard::read_plain_file(&file) {
                Ok(entries) => entries,
                Err(err) => {
                    report.errors.push(format!("{}: {err}", file.display()));
                    continue;
                }
            };
            for entry in pending {
                let shard = shard_key(&entry);
                let lock = self.lock_for(&shard);
                let _guard = lock.lock().await;
                let path = shard::standard_shard_path(&self.root, &shard);
                let existing = shard::read_gz_shard(&path)?;
                if existing.iter().any(|e| dedup_key(e) == dedup_key(&entry)) {
                    continue;
                }
                shard::append_gz_frame(&path, &entry)?;
                report.merged += 1;
            }
            std::fs::remove_file(&file)?;
        }
        Ok(report)
    }

    pub fn query(&self, filter: &ProvenanceQuery) -> Result<Vec<CompactDiscoveryEntry>, ProvenanceError> {
        let shards_dir = self.root.join("shards");
        if !shards_dir.exists() {
            return Ok(Vec::new());
        }
        let mut matched = Vec::new();
        for entry in std::fs::read_dir(&shards_dir)? {
            let path = entry?.path();
            if !path.extension().map(|e| e == "gz").unwrap_or(false) {
                continue;
            }
            for record in shard::read_gz_shard(&path)? {
                if filter.matches(&record) {
                    matched.push(record);
                }
            }
        }
        Ok(matched)
    }

    pub fn get_stats(&self) -> Result<ProvenanceStats, ProvenanceError> {
        let all = self.query(&ProvenanceQuery::default())?;
        Ok(ProvenanceStats::summarize(&all))
    }
}

fn dedup_key(entry: &CompactDiscoveryEntry) -> (String, i64, String) {
    (entry.agent_id.clone(), entry.timestamp.timestamp_millis(), entry.source_label.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(agent_id: &str, state: &str) -> CompactDiscoveryEntry {
        CompactDiscoveryEntry {
            fips: "06037".into(),
            city_name: "Los Angeles".into(),
            state: state.into(),
            population: Some(3_900_000),
            tier: "county".into(),
            feature_count: 1,
            confidence: 92,
            authority_level: 5,
            source_label: "ca-commission".into(),
            url: "https://example.com/b.geojson".into(),
            quality: shadow_atlas_contracts::provenance::QualitySummary {
                valid: true,
                topology: true,
                response_ms: 120,
                data_date: None,
            },
            why_strings: vec![],
            tried_tiers: vec!["primary".into()],
            blocked_reason: None,
            timestamp: Utc::now(),
            agent_id: agent_id.into(),
        }
    }

    #[tokio::test]
    async fn standard_append_then_query_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ProvenanceWriter::new(dir.path());
        let entry = sample("agent-1", "CA");
        writer.append(&entry, WriteMode::Standard).await.unwrap();

        let results = writer.query(&ProvenanceQuery::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].fips, "06037");
    }

    #[tokio::test]
    async fn staging_merge_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ProvenanceWriter::new(dir.path());
        let entry = sample("agent-1", "CA");
        writer.append(&entry, WriteMode::Staging { agent_id: "agent-1".into() }).await.unwrap();

        let first = writer.merge_staging_files().await.unwrap();
        assert_eq!(first.merged, 1);

        writer.append(&entry, WriteMode::Staging { agent_id: "agent-1".into() }).await.unwrap();
        let second = writer.merge_staging_files().await.unwrap();
        assert_eq!(second.merged, 0, "duplicate entry must not be merged twice");

        let all = writer.query(&ProvenanceQuery::default()).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn stats_summarize_across_shards() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ProvenanceWriter::new(dir.path());
        writer.append(&sample("agent-1", "CA"), WriteMode::Standard).await.unwrap();
        writer.append(&sample("agent-2", "NY"), WriteMode::Standard).await.unwrap();

        let stats = writer.get_stats().unwrap();
        assert_eq!(stats.total, 2);
        assert!((stats.average_confidence - 92.0).abs() < f64::EPSILON);
    }
}
