//! Authority / Source Registry (spec §4.1): an in-memory, read-only-after-init
//! catalog of who may speak for a boundary type and where to find their data.

mod seed;

use shadow_atlas_contracts::{BoundaryType, Jurisdiction, SourceDescriptor, SourceKind, UpdateTrigger};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no authority entry registered for boundary type {0}")]
    UnknownBoundaryType(BoundaryType),
}

/// Aggregate authority metadata for one boundary type, plus the sources
/// that speak for it.
#[derive(Debug, Clone)]
pub struct AuthorityEntry {
    pub primary_sources: Vec<SourceDescriptor>,
    pub aggregator_sources: Vec<SourceDescriptor>,
    pub update_triggers: Vec<UpdateTrigger>,
    pub expected_lag_days: u32,
    pub authority_entity: String,
    pub legal_basis: String,
}

/// Process-wide, read-only-after-init catalog. Construct once at startup
/// with [`SourceRegistry::seeded`] (or [`SourceRegistry::new`] for tests
/// with a custom source list) and share behind an `Arc`.
pub struct SourceRegistry {
    authority: HashMap<BoundaryType, AuthorityEntry>,
    by_jurisdiction: HashMap<String, Vec<SourceDescriptor>>,
}

impl SourceRegistry {
    /// Builds the registry from an explicit source list, grouping by
    /// boundary type and jurisdiction. Every [`BoundaryType`] variant gets
    /// an (possibly empty) authority entry so [`get_authority`] is total.
    pub fn new(sources: Vec<SourceDescriptor>) -> Self {
        let mut authority: HashMap<BoundaryType, AuthorityEntry> = BoundaryType::ALL
            .iter()
            .map(|bt| {
                (
                    *bt,
                    AuthorityEntry {
                        primary_sources: Vec::new(),
                        aggregator_sources: Vec::new(),
                        update_triggers: Vec::new(),
                        expected_lag_days: seed::expected_lag_days(*bt),
                        authority_entity: seed::authority_entity(*bt),
                        legal_basis: seed::legal_basis(*bt),
                    },
                )
            })
            .collect();

        let mut by_jurisdiction: HashMap<String, Vec<SourceDescriptor>> = HashMap::new();

        for source in sources {
            let entry = authority
                .get_mut(&source.boundary_type)
                .expect("seeded with every BoundaryType variant");
            match source.kind {
                SourceKind::Primary => entry.primary_sources.push(source.clone()),
                SourceKind::Aggregator => entry.aggregator_sources.push(source.clone()),
            }
            entry.update_triggers.push(seed::trigger_for(&source));

            by_jurisdiction
                .entry(source.jurisdiction.as_str().to_string())
                .or_default()
                .push(source);
        }

        for entry in authority.values_mut() {
            entry.aggregator_sources.sort_by_key(|s| s.preference_rank);
            entry.primary_sources.sort_by_key(|s| s.preference_rank);
        }

        Self { authority, by_jurisdiction }
    }

    /// Builds the registry from the embedded static seed table.
    pub fn seeded() -> Self {
        Self::new(seed::seed_sources())
    }

    pub fn get_authority(&self, boundary_type: BoundaryType) -> Result<&AuthorityEntry, RegistryError> {
        self.authority.get(&boundary_type).ok_or(RegistryError::UnknownBoundaryType(boundary_type))
    }

    /// Primary sources registered for an uppercase, case-sensitive state
    /// code. Unknown codes return an empty list, never an error.
    pub fn get_primary_sources_for_state(&self, code: &str) -> Vec<SourceDescriptor> {
        self.by_jurisdiction
            .get(code)
            .map(|sources| sources.iter().filter(|s| s.kind == SourceKind::Primary).cloned().collect())
            .unwrap_or_default()
    }

    /// Aggregator sources for a boundary type, ordered by preference rank.
    pub fn get_aggregator_sources(&self, boundary_type: BoundaryType) -> Vec<SourceDescriptor> {
        self.authority.get(&boundary_type).map(|e| e.aggregator_sources.clone()).unwrap_or_default()
    }

    pub fn has_primary_sources(&self, boundary_type: BoundaryType) -> bool {
        self.authority.get(&boundary_type).map(|e| !e.primary_sources.is_empty()).unwrap_or(false)
    }

    /// True during a decennial redistricting or gap year (year mod 10 is 1 or 2).
    pub fn is_redistricting_window(&self, year: Option<i32>) -> bool {
        let year = year.unwrap_or_else(|| chrono::Utc::now().format("%Y").to_string().parse().unwrap_or(2024));
        matches!(year.rem_euclid(10), 1 | 2)
    }

    /// Sorted, de-duplicated state codes with at least one primary source,
    /// excluding the wildcard jurisdiction.
    pub fn get_states_with_primary_sources(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .by_jurisdiction
            .iter()
            .filter(|(code, sources)| {
                code.as_str() != Jurisdiction::WILDCARD && sources.iter().any(|s| s.kind == SourceKind::Primary)
            })
            .map(|(code, _)| code.clone())
            .collect();
        codes.sort();
        codes.dedup();
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_authority_is_total_over_enumeration() {
        let registry = SourceRegistry::seeded();
        for bt in BoundaryType::ALL {
            assert!(registry.get_authority(bt).is_ok());
        }
    }

    #[test]
    fn unknown_state_has_no_primary_sources() {
        let registry = SourceRegistry::seeded();
        assert!(registry.get_primary_sources_for_state("ZZ").is_empty());
    }

    #[test]
    fn aggregator_sources_sorted_by_preference_rank() {
        let registry = SourceRegistry::seeded();
        let aggregators = registry.get_aggregator_sources(BoundaryType::Congressional);
        let ranks: Vec<u32> = aggregators.iter().map(|s| s.preference_rank).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
    }

    #[test]
    fn states_with_primary_sources_excludes_wildcard() {
        let registry = SourceRegistry::seeded();
        let states = registry.get_states_with_primary_sources();
        assert!(!states.iter().any(|s| s == "*"));
        let mut sorted = states.clone();
        sorted.sort();
        assert_eq!(states, sorted);
    }

    #[test]
    fn redistricting_window_matches_year_mod_ten() {
        let registry = SourceRegistry::seeded();
        assert!(registry.is_redistricting_window(Some(2021)));
        assert!(registry.is_redistricting_window(Some(2022)));
        assert!(!registry.is_redistricting_window(Some(2024)));
    }
}
