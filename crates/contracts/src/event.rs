//! Change-detection report entities (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTrigger {
    Scheduled,
    Manual,
    Forced,
}

/// Lifecycle classification of a `ChangeReport` (spec §3) — distinct from
/// the per-check `content | metadata | none` classification the Enhanced
/// Change Detector produces (spec §4.5, `shadow_atlas_change_detector::Kind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    New,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeReport {
    pub source_id: String,
    pub url: String,
    pub old_checksum: Option<String>,
    pub new_checksum: String,
    pub detected_at: DateTime<Utc>,
    pub trigger: ChangeTrigger,
    pub change_type: ChangeType,
}
