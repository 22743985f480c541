//! Validity-Window Calculator (spec §4.2): (sourceKind, boundaryType,
//! releaseDate, asOf) -> confidence in [0,1].

use crate::gap::{gap_confidence_factor, is_legislative};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use shadow_atlas_contracts::{BoundaryType, SourceKind};

/// Primary sources hold full confidence for their entire nominal window;
/// only TIGER/aggregator confidence decays and is subject to redistricting
/// overrides.
pub fn confidence(
    source_kind: SourceKind,
    boundary_type: BoundaryType,
    release_date: DateTime<Utc>,
    as_of: DateTime<Utc>,
) -> f64 {
    if source_kind == SourceKind::Primary {
        return 1.0;
    }

    let mut value = tiger_window_confidence(release_date, as_of);

    if is_legislative(boundary_type) {
        let year = as_of.year();
        if year.rem_euclid(10) == 1 {
            value = 0.5;
        } else if is_gap_period(as_of) {
            value = gap_confidence_factor(boundary_type);
        } else if year.rem_euclid(10) == 2 && as_of.month() >= 7 {
            value = 0.9;
        } else if in_grace_period(as_of) {
            value = value.min(0.7);
        }
    } else if is_gap_period(as_of) {
        value = gap_confidence_factor(boundary_type);
    }

    value.clamp(0.0, 1.0)
}

fn is_gap_period(as_of: DateTime<Utc>) -> bool {
    as_of.year().rem_euclid(10) == 2 && as_of.month() <= 6
}

fn in_grace_period(as_of: DateTime<Utc>) -> bool {
    let cycle = crate::gap::cycle_for(as_of);
    as_of >= cycle.gap_end && as_of < cycle.grace_end
}

/// TIGER confidence decay within its annual window: full confidence for
/// the first 75%, linear decay to 0.4 across the last 25%, zero outside.
fn tiger_window_confidence(release_date: DateTime<Utc>, as_of: DateTime<Utc>) -> f64 {
    let year = release_date.year();
    let valid_from = Utc.with_ymd_and_hms(year, 7, 1, 0, 0, 0).unwrap();
    let valid_until = Utc.with_ymd_and_hms(year + 1, 7, 1, 0, 0, 0).unwrap();

    if as_of < valid_from || as_of >= valid_until {
        return 0.0;
    }

    let window = (valid_until - valid_from).num_seconds() as f64;
    let elapsed = (as_of - valid_from).num_seconds() as f64;
    let fraction = elapsed / window;

    if fraction <= 0.75 {
        1.0
    } else {
        let decay_fraction = (fraction - 0.75) / 0.25;
        1.0 - decay_fraction * 0.6
    }
}

/// `getExpirationWarning(year, asOf)`: a message iff `0 < daysUntilExpiration <= 30`.
pub fn expiration_warning(year: i32, as_of: DateTime<Utc>) -> Option<String> {
    let valid_until = Utc.with_ymd_and_hms(year + 1, 7, 1, 0, 0, 0).unwrap();
    let days_until_expiration = (valid_until - as_of).num_days();
    if days_until_expiration > 0 && days_until_expiration <= 30 {
        Some(format!("TIGER vintage {year} expires in {days_until_expiration} day(s)"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn primary_source_is_always_full_confidence() {
        let c = confidence(SourceKind::Primary, BoundaryType::County, dt(2024, 1, 1), dt(2030, 1, 1));
        assert_eq!(c, 1.0);
    }

    #[test]
    fn tiger_is_full_confidence_for_first_three_quarters() {
        let release = dt(2024, 7, 1);
        let c = confidence(SourceKind::Aggregator, BoundaryType::County, release, dt(2025, 1, 1));
        assert_eq!(c, 1.0);
    }

    #[test]
    fn tiger_decays_in_final_quarter() {
        let release = dt(2024, 7, 1);
        let c = confidence(SourceKind::Aggregator, BoundaryType::County, release, dt(2025, 6, 15));
        assert!(c < 1.0 && c >= 0.4);
    }

    #[test]
    fn tiger_is_zero_outside_window() {
        let release = dt(2024, 7, 1);
        let c = confidence(SourceKind::Aggregator, BoundaryType::County, release, dt(2023, 1, 1));
        assert_eq!(c, 0.0);
    }

    #[test]
    fn first_redistricting_year_forces_legislative_tiger_to_half() {
        let c = confidence(SourceKind::Aggregator, BoundaryType::Congressional, dt(2020, 7, 1), dt(2021, 3, 1));
        assert_eq!(c, 0.5);
    }

    #[test]
    fn gap_period_forces_legislative_tiger_to_point_three() {
        let c = confidence(SourceKind::Aggregator, BoundaryType::StateSenate, dt(2020, 7, 1), dt(2022, 3, 1));
        assert_eq!(c, 0.3);
    }

    #[test]
    fn post_gap_same_year_is_point_nine() {
        let c = confidence(SourceKind::Aggregator, BoundaryType::StateHouse, dt(2022, 7, 1), dt(2022, 8, 1));
        assert_eq!(c, 0.9);
    }

    #[test]
    fn grace_period_after_gap_year_caps_legislative_confidence() {
        let c = confidence(SourceKind::Aggregator, BoundaryType::StateHouse, dt(2022, 7, 1), dt(2023, 3, 1));
        assert_eq!(c, 0.7);
    }

    #[test]
    fn expiration_warning_only_within_thirty_days() {
        let release_year = 2024;
        assert!(expiration_warning(release_year, dt(2025, 6, 15)).is_some());
        assert!(expiration_warning(release_year, dt(2025, 1, 1)).is_none());
        assert!(expiration_warning(release_year, dt(2025, 7, 1)).is_none());
    }
}
