//! Conflict-resolution entities (spec §3, §4.6).

use crate::boundary::{AuthorityLevel, SourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One source's claim to define a boundary, as seen by the conflict
/// resolver. Built from a `CanonicalSource` + the freshness check that ran
/// against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceClaim {
    pub source_id: String,
    pub source_name: String,
    pub boundary: String,
    pub last_modified: DateTime<Utc>,
    pub kind: SourceKind,
    pub authority_level: AuthorityLevel,
    pub etag: Option<String>,
    pub version: Option<String>,
}

/// A rejected alternative, with the reason and how far behind the winner
/// it was in wall-clock time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionReject {
    pub source_id: String,
    pub reason: String,
    pub freshness_gap_ms: i64,
}

/// Immutable once written: the record of why a particular source won.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionDecision {
    pub boundary_id: String,
    pub winner_source_id: String,
    pub reason: String,
    pub freshness: DateTime<Utc>,
    pub alternatives_counted: usize,
    pub timestamp: DateTime<Utc>,
    /// 0-100.
    pub confidence: u8,
    pub manual_override: bool,
    pub rejected: Vec<ResolutionReject>,
}
