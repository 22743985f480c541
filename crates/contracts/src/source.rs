//! Static and dynamic source entities (spec §3).

use crate::boundary::{AuthorityLevel, BoundaryType, Jurisdiction, SourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Static, registry-defined description of a source. Immutable for the
/// lifetime of the process; editing it requires a restart (spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,
    pub kind: SourceKind,
    pub authority_level: AuthorityLevel,
    /// 1 = most preferred, totally ordered within a boundary type.
    pub preference_rank: u32,
    pub boundary_type: BoundaryType,
    pub jurisdiction: Jurisdiction,
    pub entity: String,
    pub legal_basis: String,
    pub url: SourceUrl,
    pub publish_schedule_hints: Vec<String>,
    pub machine_readable: bool,
    pub format: String,
}

/// Either a direct URL, or a template containing the literal `{YEAR}` token
/// (required for aggregator sources — spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceUrl {
    Direct(String),
    Template(String),
}

impl SourceUrl {
    /// Resolve a template against the current calendar year; direct URLs
    /// pass through unchanged.
    pub fn resolve(&self, year: i32) -> String {
        match self {
            SourceUrl::Direct(url) => url.clone(),
            SourceUrl::Template(template) => template.replace("{YEAR}", &year.to_string()),
        }
    }

    pub fn is_valid_template(&self) -> bool {
        match self {
            SourceUrl::Direct(_) => true,
            SourceUrl::Template(t) => t.contains("{YEAR}"),
        }
    }
}

/// Dynamic, per-entry record tracked by the orchestrator between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalSource {
    pub id: String,
    pub url: String,
    pub boundary_type: BoundaryType,
    pub last_checksum: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
    pub next_scheduled_check: DateTime<Utc>,
    pub update_triggers: Vec<UpdateTrigger>,
}

impl CanonicalSource {
    /// `nextScheduledCheck >= lastChecked` whenever both are set (spec §3).
    pub fn invariant_holds(&self) -> bool {
        match (self.last_checked, Some(self.next_scheduled_check)) {
            (Some(checked), Some(next)) => next >= checked,
            _ => true,
        }
    }
}

/// Tagged variant describing when a source is expected to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateTrigger {
    Annual { month: u8 },
    Redistricting { years: Vec<i32> },
    Census { year: i32 },
    Event { description: String },
    Manual,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_requires_year_token() {
        assert!(SourceUrl::Template("https://tiger.census.gov/{YEAR}/".into()).is_valid_template());
        assert!(!SourceUrl::Template("https://tiger.census.gov/static/".into()).is_valid_template());
    }

    #[test]
    fn template_resolves_year() {
        let url = SourceUrl::Template("https://tiger.census.gov/{YEAR}/tl.zip".into());
        assert_eq!(url.resolve(2024), "https://tiger.census.gov/2024/tl.zip");
    }

    #[test]
    fn canonical_source_invariant() {
        let now = Utc::now();
        let mut source = CanonicalSource {
            id: "s1".into(),
            url: "https://example.com".into(),
            boundary_type: BoundaryType::County,
            last_checksum: None,
            last_checked: Some(now),
            next_scheduled_check: now,
            update_triggers: vec![],
        };
        assert!(source.invariant_holds());
        source.next_scheduled_check = now - chrono::Duration::days(1);
        assert!(!source.invariant_holds());
    }
}
