//! Gap Detector (spec §4.3): redistricting-cycle awareness and per-state
//! finalization tracking.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use shadow_atlas_contracts::BoundaryType;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapType {
    None,
    PreFinalization,
    PostFinalizationPreTiger,
    PostTiger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapRecommendation {
    UseTiger,
    UsePrimary,
}

#[derive(Debug, Clone)]
pub struct FinalizationInfo {
    pub finalized_date: DateTime<Utc>,
    pub effective_date: DateTime<Utc>,
    pub court_challenges: bool,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct BoundaryGapStatus {
    pub in_gap: bool,
    pub gap_type: GapType,
    pub recommendation: GapRecommendation,
    pub reasoning: String,
    pub finalization_info: Option<FinalizationInfo>,
}

#[derive(Debug, Clone)]
pub struct CycleInfo {
    pub census_year: i32,
    pub first_redistricting_year: i32,
    pub gap_year: i32,
    pub gap_start: DateTime<Utc>,
    pub gap_end: DateTime<Utc>,
    pub grace_end: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StateGapSummary {
    pub state_code: String,
    pub gap_days: i64,
    pub recommendation: GapRecommendation,
}

pub fn is_legislative(boundary_type: BoundaryType) -> bool {
    matches!(
        boundary_type,
        BoundaryType::Congressional | BoundaryType::StateSenate | BoundaryType::StateHouse
    )
}

pub struct GapDetector {
    finalization: HashMap<String, FinalizationInfo>,
}

impl GapDetector {
    pub fn new(finalization: HashMap<String, FinalizationInfo>) -> Self {
        Self { finalization }
    }

    pub fn seeded() -> Self {
        Self::new(seed_finalization_table())
    }

    /// True iff `as_of` falls in Jan-Jun of a year ≡ 2 (mod 10) — the
    /// nationwide redistricting gap window.
    pub fn is_in_gap(&self, as_of: DateTime<Utc>) -> bool {
        as_of.year().rem_euclid(10) == 2 && as_of.month() <= 6
    }

    /// Cycle metadata during the redistricting or grace window; `None`
    /// otherwise.
    pub fn get_current_cycle(&self, as_of: DateTime<Utc>) -> Option<CycleInfo> {
        let cycle = cycle_for(as_of);
        let cycle_start = Utc.with_ymd_and_hms(cycle.first_redistricting_year, 1, 1, 0, 0, 0).unwrap();
        if as_of >= cycle_start && as_of < cycle.grace_end {
            Some(cycle)
        } else {
            None
        }
    }

    pub fn check_boundary_gap(
        &self,
        boundary_type: BoundaryType,
        state: &str,
        as_of: DateTime<Utc>,
    ) -> BoundaryGapStatus {
        if !is_legislative(boundary_type) {
            return BoundaryGapStatus {
                in_gap: false,
                gap_type: GapType::None,
                recommendation: GapRecommendation::UseTiger,
                reasoning: "non-legislative boundary types are never affected by the redistricting gap".into(),
                finalization_info: None,
            };
        }

        let redistricting_window = matches!(as_of.year().rem_euclid(10), 1 | 2);
        let info = self.finalization.get(state);

        match info {
            None if redistricting_window => BoundaryGapStatus {
                in_gap: true,
                gap_type: GapType::PreFinalization,
                recommendation: GapRecommendation::UseTiger,
                reasoning: format!("no finalization record for {state}; defaulting to TIGER until one is known"),
                finalization_info: None,
            },
            None => BoundaryGapStatus {
                in_gap: false,
                gap_type: GapType::None,
                recommendation: GapRecommendation::UseTiger,
                reasoning: format!("no active redistricting cycle and no finalization record for {state}"),
                finalization_info: None,
            },
            Some(info) => {
                if as_of < info.finalized_date {
                    BoundaryGapStatus {
                        in_gap: true,
                        gap_type: GapType::PreFinalization,
                        recommendation: GapRecommendation::UseTiger,
                        reasoning: format!("{state} has not yet finalized new boundaries"),
                        finalization_info: Some(info.clone()),
                    }
                } else if as_of < info.effective_date {
                    BoundaryGapStatus {
                        in_gap: true,
                        gap_type: GapType::PostFinalizationPreTiger,
                        recommendation: GapRecommendation::UsePrimary,
                        reasoning: format!("{state} finalized boundaries but TIGER has not incorporated them yet"),
                        finalization_info: Some(info.clone()),
                    }
                } else {
                    BoundaryGapStatus {
                        in_gap: false,
                        gap_type: GapType::PostTiger,
                        recommendation: GapRecommendation::UseTiger,
                        reasoning: format!("{state} boundaries are finalized and in effect"),
                        finalization_info: Some(info.clone()),
                    }
                }
            }
        }
    }

    /// States currently past their effective date within the nationwide
    /// gap window, sorted by days elapsed since that date (descending).
    pub fn get_states_in_gap(&self, as_of: DateTime<Utc>) -> Vec<StateGapSummary> {
        if !self.is_in_gap(as_of) {
            return Vec::new();
        }
        let mut summaries: Vec<StateGapSummary> = self
            .finalization
            .iter()
            .filter(|(_, info)| as_of >= info.effective_date)
            .map(|(state, info)| StateGapSummary {
                state_code: state.clone(),
                gap_days: (as_of - info.effective_date).num_days(),
                recommendation: GapRecommendation::UsePrimary,
            })
            .collect();
        summaries.sort_by(|a, b| b.gap_days.cmp(&a.gap_days));
        summaries
    }
}

/// Per-boundary-type confidence factor applied while the nationwide gap
/// window is active (spec §4.2, §4.3).
pub fn gap_confidence_factor(boundary_type: BoundaryType) -> f64 {
    match boundary_type {
        BoundaryType::Congressional | BoundaryType::StateSenate | BoundaryType::StateHouse => 0.3,
        BoundaryType::VotingPrecinct => 0.6,
        BoundaryType::County => 0.8,
        _ => 1.0,
    }
}

/// The cycle whose redistricting/gap/grace window covers `as_of`: the most
/// recently started cycle if its grace period hasn't lapsed yet, otherwise
/// the next one.
pub(crate) fn cycle_for(as_of: DateTime<Utc>) -> CycleInfo {
    let year = as_of.year();
    let r = year.rem_euclid(10);
    // Nearest year ≡ 2 (mod 10) at or before this year.
    let prev_gap_year = if r >= 2 { year - r + 2 } else { year - r - 8 };
    let prev = build_cycle(prev_gap_year);
    if as_of < prev.grace_end {
        prev
    } else {
        build_cycle(prev_gap_year + 10)
    }
}

fn build_cycle(gap_year: i32) -> CycleInfo {
    let census_year = gap_year - 2;
    let gap_start = Utc.with_ymd_and_hms(gap_year, 1, 1, 0, 0, 0).unwrap();
    let gap_end = Utc.with_ymd_and_hms(gap_year, 7, 1, 0, 0, 0).unwrap();
    let grace_end = gap_end + Duration::days(18 * 30);
    CycleInfo {
        census_year,
        first_redistricting_year: gap_year - 1,
        gap_year,
        gap_start,
        gap_end,
        grace_end,
    }
}

fn seed_finalization_table() -> HashMap<String, FinalizationInfo> {
    let mut table = HashMap::new();
    let states: &[(&str, (i32, u32, u32), (i32, u32, u32), bool, &str)] = &[
        ("CA", (2021, 12, 27), (2022, 1, 1), true, "Citizens Redistricting Commission adopted final maps"),
        ("TX", (2021, 10, 25), (2022, 1, 1), true, "Legislature adopted plans in special session"),
        ("NY", (2022, 4, 20), (2022, 5, 1), true, "Court-drawn maps after commission deadlock"),
        ("FL", (2022, 4, 22), (2022, 5, 1), true, "Governor-proposed congressional map enacted"),
        ("PA", (2022, 2, 23), (2022, 3, 1), true, "State Supreme Court selected remedial map"),
        ("IL", (2021, 11, 23), (2022, 1, 1), false, "Legislature adopted final maps"),
        ("OH", (2022, 3, 2), (2022, 3, 15), true, "Ohio Redistricting Commission adopted maps"),
        ("GA", (2021, 12, 30), (2022, 1, 1), true, "Legislature adopted maps in special session"),
        ("NC", (2021, 11, 4), (2022, 1, 1), true, "Legislature adopted maps, later redrawn by court order"),
        ("MI", (2021, 12, 28), (2022, 1, 1), false, "Independent Citizens Redistricting Commission adopted maps"),
        ("AZ", (2021, 12, 22), (2022, 1, 1), false, "Independent Redistricting Commission adopted final maps"),
        ("WA", (2021, 11, 15), (2022, 1, 1), false, "Redistricting Commission adopted maps"),
        ("VA", (2021, 12, 28), (2022, 1, 1), false, "Virginia Supreme Court adopted special masters' maps"),
        ("TN", (2022, 2, 5), (2022, 2, 15), false, "Legislature adopted final maps"),
        ("IN", (2021, 10, 4), (2022, 1, 1), false, "Legislature adopted final maps"),
        ("MO", (2022, 5, 19), (2022, 6, 1), false, "Legislature adopted final maps after lengthy debate"),
        ("WI", (2022, 3, 3), (2022, 3, 15), true, "State Supreme Court selected legislature's remedial maps"),
        ("CO", (2021, 11, 15), (2022, 1, 1), false, "Independent Redistricting Commission adopted final maps"),
        ("MD", (2021, 12, 9), (2022, 1, 1), true, "Legislature adopted maps, congressional map later redrawn"),
        ("OR", (2021, 9, 27), (2022, 1, 1), false, "Legislature adopted final maps"),
    ];
    for (code, finalized, effective, court_challenges, notes) in states {
        table.insert(
            code.to_string(),
            FinalizationInfo {
                finalized_date: Utc.with_ymd_and_hms(finalized.0, finalized.1, finalized.2, 0, 0, 0).unwrap(),
                effective_date: Utc.with_ymd_and_hms(effective.0, effective.1, effective.2, 0, 0, 0).unwrap(),
                court_challenges: *court_challenges,
                notes: notes.to_string(),
            },
        );
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_in_gap_matches_jan_jun_of_year_mod_ten_eq_two() {
        let detector = GapDetector::seeded();
        assert!(detector.is_in_gap(Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap()));
        assert!(!detector.is_in_gap(Utc.with_ymd_and_hms(2022, 8, 1, 0, 0, 0).unwrap()));
        assert!(!detector.is_in_gap(Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn non_legislative_boundary_never_in_gap() {
        let detector = GapDetector::seeded();
        let status = detector.check_boundary_gap(
            BoundaryType::County,
            "CA",
            Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap(),
        );
        assert!(!status.in_gap);
        assert_eq!(status.recommendation, GapRecommendation::UseTiger);
    }

    #[test]
    fn unknown_state_during_redistricting_defaults_to_pre_finalization() {
        let detector = GapDetector::seeded();
        let status = detector.check_boundary_gap(
            BoundaryType::Congressional,
            "ZZ",
            Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap(),
        );
        assert!(status.in_gap);
        assert_eq!(status.gap_type, GapType::PreFinalization);
    }

    #[test]
    fn known_state_transitions_through_gap_types() {
        let detector = GapDetector::seeded();
        let pre = detector.check_boundary_gap(
            BoundaryType::Congressional,
            "CA",
            Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap(),
        );
        assert_eq!(pre.gap_type, GapType::PreFinalization);

        let post_final = detector.check_boundary_gap(
            BoundaryType::Congressional,
            "CA",
            Utc.with_ymd_and_hms(2021, 12, 28, 0, 0, 0).unwrap(),
        );
        assert_eq!(post_final.gap_type, GapType::PostFinalizationPreTiger);

        let post_tiger = detector.check_boundary_gap(
            BoundaryType::Congressional,
            "CA",
            Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).unwrap(),
        );
        assert_eq!(post_tiger.gap_type, GapType::PostTiger);
        assert!(!post_tiger.in_gap);
    }

    #[test]
    fn gap_confidence_factor_matches_boundary_type() {
        assert_eq!(gap_confidence_factor(BoundaryType::Congressional), 0.3);
        assert_eq!(gap_confidence_factor(BoundaryType::VotingPrecinct), 0.6);
        assert_eq!(gap_confidence_factor(BoundaryType::County), 0.8);
        assert_eq!(gap_confidence_factor(BoundaryType::Library), 1.0);
    }

    #[test]
    fn states_in_gap_sorted_descending_by_gap_days() {
        let detector = GapDetector::seeded();
        let summaries = detector.get_states_in_gap(Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).unwrap());
        assert!(!summaries.is_empty());
        for pair in summaries.windows(2) {
            assert!(pair[0].gap_days >= pair[1].gap_days);
        }
    }
}
