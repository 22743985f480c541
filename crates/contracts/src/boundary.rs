//! Boundary-type taxonomy and the authority/jurisdiction primitives built on it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed enumeration of boundary types Shadow Atlas ingests.
///
/// `precision_rank` is a total, contiguous ordering from the finest civic
/// grain (0) to the coarsest (19). Tests at the bottom of this module check
/// that the mapping stays exhaustive and contiguous as variants are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryType {
    VotingPrecinct,
    CityCouncilWard,
    CityCouncil,
    Place,
    Cdp,
    SchoolElementary,
    SchoolSecondary,
    SchoolUnified,
    Library,
    Fire,
    Hospital,
    Water,
    Utility,
    Transit,
    County,
    StateHouse,
    StateSenate,
    Congressional,
}

impl BoundaryType {
    /// All variants, in ascending precision-rank order.
    pub const ALL: [BoundaryType; 18] = [
        BoundaryType::VotingPrecinct,
        BoundaryType::CityCouncilWard,
        BoundaryType::CityCouncil,
        BoundaryType::Place,
        BoundaryType::Cdp,
        BoundaryType::SchoolElementary,
        BoundaryType::SchoolSecondary,
        BoundaryType::SchoolUnified,
        BoundaryType::Library,
        BoundaryType::Fire,
        BoundaryType::Hospital,
        BoundaryType::Water,
        BoundaryType::Utility,
        BoundaryType::Transit,
        BoundaryType::County,
        BoundaryType::StateHouse,
        BoundaryType::StateSenate,
        BoundaryType::Congressional,
    ];

    /// 0 = finest civic grain, 19 = coarsest. Totally ordered, contiguous.
    pub fn precision_rank(self) -> u8 {
        Self::ALL
            .iter()
            .position(|bt| *bt == self)
            .expect("BoundaryType::ALL is exhaustive") as u8
    }

    /// Legislative boundary types get redistricting-cycle-aware confidence
    /// treatment in `freshness` (spec §4.2, §4.3).
    pub fn is_legislative(self) -> bool {
        matches!(
            self,
            BoundaryType::Congressional | BoundaryType::StateSenate | BoundaryType::StateHouse
        )
    }
}

impl fmt::Display for BoundaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BoundaryType::Congressional => "congressional",
            BoundaryType::StateSenate => "state_senate",
            BoundaryType::StateHouse => "state_house",
            BoundaryType::County => "county",
            BoundaryType::Place => "place",
            BoundaryType::CityCouncil => "city_council",
            BoundaryType::CityCouncilWard => "city_council_ward",
            BoundaryType::Cdp => "CDP",
            BoundaryType::SchoolUnified => "school_unified",
            BoundaryType::SchoolElementary => "school_elementary",
            BoundaryType::SchoolSecondary => "school_secondary",
            BoundaryType::Fire => "fire",
            BoundaryType::Library => "library",
            BoundaryType::Hospital => "hospital",
            BoundaryType::Water => "water",
            BoundaryType::Utility => "utility",
            BoundaryType::Transit => "transit",
            BoundaryType::VotingPrecinct => "voting_precinct",
        };
        write!(f, "{label}")
    }
}

/// Opaque jurisdiction identifier. State-scoped sources use the two-letter
/// uppercase code; `"*"` is the wildcard jurisdiction. Comparisons are
/// case-sensitive by design — callers must normalize before constructing one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Jurisdiction(String);

impl Jurisdiction {
    pub const WILDCARD: &'static str = "*";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn wildcard() -> Self {
        Self(Self::WILDCARD.to_string())
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == Self::WILDCARD
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Jurisdiction {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// `primary` = legal authority to define the boundary. `aggregator` =
/// republishes with standardization (Census TIGER). Orthogonal to freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Primary,
    Aggregator,
}

impl SourceKind {
    pub fn is_primary(self) -> bool {
        matches!(self, SourceKind::Primary)
    }
}

/// Authority level, 0 (unknown) through 5 (federal mandate). Fixed per
/// source descriptor; does not change with freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AuthorityLevel(u8);

impl AuthorityLevel {
    pub const UNKNOWN: AuthorityLevel = AuthorityLevel(0);
    pub const FEDERAL_MANDATE: AuthorityLevel = AuthorityLevel(5);

    /// Clamps to the valid 0..=5 range rather than panicking: authority
    /// levels come from static registry configuration, not untrusted input,
    /// but clamping keeps the type's invariant airtight either way.
    pub fn new(level: u8) -> Self {
        Self(level.min(5))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for AuthorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn precision_rank_is_contiguous_and_exhaustive() {
        let mut seen = HashSet::new();
        for bt in BoundaryType::ALL {
            let rank = bt.precision_rank();
            assert!(seen.insert(rank), "duplicate rank {rank}");
        }
        let mut ranks: Vec<u8> = BoundaryType::ALL.iter().map(|b| b.precision_rank()).collect();
        ranks.sort_unstable();
        let expected: Vec<u8> = (0..BoundaryType::ALL.len() as u8).collect();
        assert_eq!(ranks, expected);
    }

    #[test]
    fn legislative_types_are_the_three_redistricting_types() {
        let legislative: Vec<_> = BoundaryType::ALL.iter().copied().filter(|b| b.is_legislative()).collect();
        assert_eq!(
            legislative,
            vec![BoundaryType::StateHouse, BoundaryType::StateSenate, BoundaryType::Congressional]
        );
    }

    #[test]
    fn authority_level_clamps() {
        assert_eq!(AuthorityLevel::new(9).value(), 5);
        assert_eq!(AuthorityLevel::new(3).value(), 3);
    }

    #[test]
    fn jurisdiction_wildcard() {
        assert!(Jurisdiction::wildcard().is_wildcard());
        assert!(!Jurisdiction::new("CA").is_wildcard());
    }
}
