//! Confidence-based refresh scheduling (spec §4.5): turns a batch of
//! per-source confidence scores into a single next-refresh recommendation.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
pub struct ScoredSource {
    pub source_id: String,
    pub confidence: f64,
    pub next_scheduled_check: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ScheduleResult {
    pub sources: Vec<String>,
    pub next_refresh: DateTime<Utc>,
    pub check_interval: Duration,
    pub reasoning: String,
}

/// Sources whose confidence falls below `threshold` drive the schedule:
/// the earliest of their `next_scheduled_check` times becomes the next
/// refresh, and the check interval tightens to daily when that time is
/// within a week.
pub fn schedule_confidence_based_refresh(sources: &[ScoredSource], threshold: f64, as_of: DateTime<Utc>) -> ScheduleResult {
    let below: Vec<&ScoredSource> = sources.iter().filter(|s| s.confidence < threshold).collect();

    if below.is_empty() {
        return ScheduleResult {
            sources: Vec::new(),
            next_refresh: as_of + Duration::weeks(1),
            check_interval: Duration::weeks(1),
            reasoning: format!("no source below the confidence threshold of {threshold:.2}"),
        };
    }

    let next_refresh = below.iter().map(|s| s.next_scheduled_check).min().expect("below is non-empty");
    let check_interval = if next_refresh - as_of <= Duration::days(7) { Duration::days(1) } else { Duration::weeks(1) };
    let sources: Vec<String> = below.iter().map(|s| s.source_id.clone()).collect();

    ScheduleResult {
        reasoning: format!(
            "{} source(s) below confidence threshold {threshold:.2}; next refresh at {next_refresh}",
            sources.len()
        ),
        sources,
        next_refresh,
        check_interval,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str, confidence: f64, next_in_days: i64) -> ScoredSource {
        ScoredSource { source_id: id.into(), confidence, next_scheduled_check: Utc::now() + Duration::days(next_in_days) }
    }

    #[test]
    fn no_candidates_below_threshold_falls_back_to_weekly() {
        let sources = vec![source("a", 0.9, 30)];
        let result = schedule_confidence_based_refresh(&sources, 0.5, Utc::now());
        assert!(result.sources.is_empty());
        assert_eq!(result.check_interval, Duration::weeks(1));
    }

    #[test]
    fn near_term_next_refresh_uses_daily_interval() {
        let sources = vec![source("a", 0.3, 2), source("b", 0.9, 30)];
        let result = schedule_confidence_based_refresh(&sources, 0.5, Utc::now());
        assert_eq!(result.sources, vec!["a".to_string()]);
        assert_eq!(result.check_interval, Duration::days(1));
    }

    #[test]
    fn far_off_next_refresh_uses_weekly_interval() {
        let sources = vec![source("a", 0.3, 20)];
        let result = schedule_confidence_based_refresh(&sources, 0.5, Utc::now());
        assert_eq!(result.check_interval, Duration::weeks(1));
    }
}
