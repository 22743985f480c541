//! Provenance entities (spec §3, §4.8).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-artifact provenance record: everything a downstream consumer needs
/// to understand where a dataset came from and how much to trust it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub source: String,
    pub source_url: String,
    pub retrieved_at: DateTime<Utc>,
    pub data_version: Option<String>,
    pub license: Option<String>,
    pub processing_steps: Vec<String>,
    pub authority: AuthorityInfo,
    pub freshness: FreshnessInfo,
    pub resolution: ResolutionInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityInfo {
    pub kind: String,
    pub authority_level: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreshnessInfo {
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionInfo {
    pub had_conflict: bool,
    pub alternatives_considered: usize,
    pub confidence: u8,
    pub reason: String,
}

/// Per-acquisition-attempt entry for the append-only log (spec §3, §6). The
/// short field names mirror the wire format's compact NDJSON schema
/// (`f, n, s, p, g, fc, conf, auth, src, url, q{v,t,r,d}, why[], tried[],
/// blocked, ts, aid`) — `serde(rename)` keeps the Rust-side names readable
/// while producing the documented wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactDiscoveryEntry {
    #[serde(rename = "f")]
    pub fips: String,
    #[serde(rename = "n")]
    pub city_name: String,
    #[serde(rename = "s")]
    pub state: String,
    #[serde(rename = "p")]
    pub population: Option<u64>,
    #[serde(rename = "g")]
    pub tier: String,
    #[serde(rename = "fc")]
    pub feature_count: u64,
    #[serde(rename = "conf")]
    pub confidence: u8,
    #[serde(rename = "auth")]
    pub authority_level: u8,
    #[serde(rename = "src")]
    pub source_label: String,
    pub url: String,
    #[serde(rename = "q")]
    pub quality: QualitySummary,
    #[serde(rename = "why")]
    pub why_strings: Vec<String>,
    #[serde(rename = "tried")]
    pub tried_tiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "aid")]
    pub agent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySummary {
    #[serde(rename = "v")]
    pub valid: bool,
    #[serde(rename = "t")]
    pub topology: bool,
    #[serde(rename = "r")]
    pub response_ms: u64,
    #[serde(rename = "d")]
    pub data_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_entry_round_trips_through_json() {
        let entry = CompactDiscoveryEntry {
            fips: "06037".into(),
            city_name: "Los Angeles".into(),
            state: "CA".into(),
            population: Some(3_900_000),
            tier: "county".into(),
            feature_count: 1,
            confidence: 92,
            authority_level: 5,
            source_label: "ca-commission".into(),
            url: "https://example.com/boundary.geojson".into(),
            quality: QualitySummary { valid: true, topology: true, response_ms: 120, data_date: None },
            why_strings: vec!["primary source fresher".into()],
            tried_tiers: vec!["primary".into()],
            blocked_reason: None,
            timestamp: Utc::now(),
            agent_id: "agent-1".into(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"f\":\"06037\""));
        assert!(!json.contains("blocked_reason"));
        let round_tripped: CompactDiscoveryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(round_tripped.fips, entry.fips);
    }
}
