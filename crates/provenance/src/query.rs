//! `query(filter)` and `getStats()` (spec §4.8).

use chrono::{DateTime, Utc};
use shadow_atlas_contracts::CompactDiscoveryEntry;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ProvenanceQuery {
    pub state: Option<String>,
    pub min_confidence: Option<u8>,
    pub tier: Option<String>,
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl ProvenanceQuery {
    pub(crate) fn matches(&self, entry: &CompactDiscoveryEntry) -> bool {
        if let Some(state) = &self.state {
            if !entry.state.eq_ignore_ascii_case(state) {
                return false;
            }
        }
        if let Some(min_confidence) = self.min_confidence {
            if entry.confidence < min_confidence {
                return false;
            }
        }
        if let Some(tier) = &self.tier {
            if &entry.tier != tier {
                return false;
            }
        }
        if let Some((start, end)) = self.time_range {
            if entry.timestamp < start || entry.timestamp > end {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProvenanceStats {
    pub total: u64,
    pub per_tier_counts: HashMap<String, u64>,
    pub average_confidence: f64,
}

impl ProvenanceStats {
    pub(crate) fn summarize(entries: &[CompactDiscoveryEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }
        let mut per_tier_counts = HashMap::new();
        let mut confidence_sum: u64 = 0;
        for entry in entries {
            *per_tier_counts.entry(entry.tier.clone()).or_insert(0u64) += 1;
            confidence_sum += entry.confidence as u64;
        }
        Self {
            total: entries.len() as u64,
            per_tier_counts,
            average_confidence: confidence_sum as f64 / entries.len() as f64,
        }
    }
}
