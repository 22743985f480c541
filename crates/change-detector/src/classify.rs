//! Pure decision logic for a single source's change assessment (spec
//! §4.5). Kept free of I/O so the classification and priority rules can be
//! tested without a network.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Content,
    Metadata,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestedAction {
    RefreshNow,
    ScheduleRefresh,
    NoAction,
}

#[derive(Debug, Clone)]
pub struct ChangeAssessment {
    pub source_id: String,
    pub has_changed: bool,
    pub change_type: ChangeKind,
    pub confidence: f64,
    pub in_redistricting_gap: bool,
    pub last_checked: Option<DateTime<Utc>>,
    pub suggested_action: SuggestedAction,
    pub reasoning: String,
}

/// header_changed: the HEAD check's ETag/Last-Modified differs from the
/// last recorded checksum. confidence: spec §4.2 validity-window value.
pub fn classify_change(header_changed: bool, confidence: f64) -> (ChangeKind, bool) {
    if header_changed {
        (ChangeKind::Content, true)
    } else if confidence < 0.4 {
        (ChangeKind::Metadata, true)
    } else {
        (ChangeKind::None, false)
    }
}

/// `gap_recommends_primary`: the redistricting gap detector says the
/// primary source should be used right now instead of TIGER.
pub fn suggest_action(
    change_type: ChangeKind,
    confidence: f64,
    gap_recommends_primary: bool,
    gap_lag_days: i64,
) -> (SuggestedAction, String) {
    if gap_recommends_primary {
        return (
            SuggestedAction::RefreshNow,
            format!("redistricting gap favors the primary source, {gap_lag_days} day(s) ahead of the aggregator"),
        );
    }
    match change_type {
        ChangeKind::Content if confidence < 0.7 => (
            SuggestedAction::ScheduleRefresh,
            format!("content changed and confidence is only {confidence:.2}"),
        ),
        ChangeKind::Metadata => (SuggestedAction::ScheduleRefresh, "metadata-only change detected".to_string()),
        _ => (SuggestedAction::NoAction, "no action required".to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// Staleness in days since last check, or `i64::MAX` when never checked.
pub fn staleness_days(last_checked: Option<DateTime<Utc>>, as_of: DateTime<Utc>) -> i64 {
    match last_checked {
        Some(checked) => (as_of - checked).num_days(),
        None => i64::MAX,
    }
}

pub fn priority_for(confidence: f64, staleness_days: i64, in_redistricting_gap: bool) -> Priority {
    if in_redistricting_gap {
        Priority::Critical
    } else if confidence < 0.4 || staleness_days > 180 {
        Priority::High
    } else if (0.4..0.7).contains(&confidence) || (90..=180).contains(&staleness_days) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

#[derive(Debug, Clone, Default)]
pub struct RefreshPriority {
    pub critical: Vec<String>,
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
    pub total_count: usize,
}

pub fn get_refresh_priority(assessments: &[ChangeAssessment], as_of: DateTime<Utc>) -> RefreshPriority {
    let mut buckets = RefreshPriority { total_count: assessments.len(), ..Default::default() };
    for assessment in assessments {
        let staleness = staleness_days(assessment.last_checked, as_of);
        match priority_for(assessment.confidence, staleness, assessment.in_redistricting_gap) {
            Priority::Critical => buckets.critical.push(assessment.source_id.clone()),
            Priority::High => buckets.high.push(assessment.source_id.clone()),
            Priority::Medium => buckets.medium.push(assessment.source_id.clone()),
            Priority::Low => buckets.low.push(assessment.source_id.clone()),
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_change_always_classifies_as_content() {
        let (kind, changed) = classify_change(true, 0.95);
        assert_eq!(kind, ChangeKind::Content);
        assert!(changed);
    }

    #[test]
    fn low_confidence_without_header_change_is_metadata() {
        let (kind, changed) = classify_change(false, 0.3);
        assert_eq!(kind, ChangeKind::Metadata);
        assert!(changed);
    }

    #[test]
    fn stable_header_and_confidence_is_no_change() {
        let (kind, changed) = classify_change(false, 0.9);
        assert_eq!(kind, ChangeKind::None);
        assert!(!changed);
    }

    #[test]
    fn gap_recommendation_always_wins_refresh_now() {
        let (action, reasoning) = suggest_action(ChangeKind::None, 0.95, true, 42);
        assert_eq!(action, SuggestedAction::RefreshNow);
        assert!(reasoning.contains("42"));
    }

    #[test]
    fn refresh_priority_buckets_sum_to_total_count() {
        let now = Utc::now();
        let assessments = vec![
            ChangeAssessment {
                source_id: "a".into(),
                has_changed: false,
                change_type: ChangeKind::None,
                confidence: 0.95,
                in_redistricting_gap: true,
                last_checked: Some(now),
                suggested_action: SuggestedAction::RefreshNow,
                reasoning: String::new(),
            },
            ChangeAssessment {
                source_id: "b".into(),
                has_changed: true,
                change_type: ChangeKind::Metadata,
                confidence: 0.2,
                in_redistricting_gap: false,
                last_checked: None,
                suggested_action: SuggestedAction::ScheduleRefresh,
                reasoning: String::new(),
            },
            ChangeAssessment {
                source_id: "c".into(),
                has_changed: false,
                change_type: ChangeKind::None,
                confidence: 0.5,
                in_redistricting_gap: false,
                last_checked: Some(now - chrono::Duration::days(100)),
                suggested_action: SuggestedAction::NoAction,
                reasoning: String::new(),
            },
            ChangeAssessment {
                source_id: "d".into(),
                has_changed: false,
                change_type: ChangeKind::None,
                confidence: 0.9,
                in_redistricting_gap: false,
                last_checked: Some(now),
                suggested_action: SuggestedAction::NoAction,
                reasoning: String::new(),
            },
        ];
        let priority = get_refresh_priority(&assessments, now);
        assert_eq!(priority.total_count, 4);
        assert_eq!(priority.critical, vec!["a".to_string()]);
        assert_eq!(priority.high, vec!["b".to_string()]);
        assert_eq!(priority.medium, vec!["c".to_string()]);
        assert_eq!(priority.low, vec!["d".to_string()]);
        let counted = priority.critical.len() + priority.high.len() + priority.medium.len() + priority.low.len();
        assert_eq!(counted, priority.total_count);
    }
}
