//! Conflict Resolver (spec §4.6): picks a winning claim among several
//! sources describing the same boundary, with primary authorities always
//! outranking aggregators.

use chrono::{DateTime, Utc};
use shadow_atlas_contracts::{ResolutionDecision, ResolutionReject, SourceClaim, SourceKind};

#[derive(Debug, thiserror::Error)]
pub enum ConflictError {
    #[error("resolveConflict invoked with no candidate claims")]
    EmptyConflict,
    #[error("no source with id {0} among the candidates")]
    UnknownSource(String),
}

/// Resolves `claims` for `boundary_id` into a single winner plus the
/// rejected alternatives. Primary sources always win over aggregators when
/// any primary is present; within a group the freshest wins, ties broken
/// by authority level (higher wins) then source id (lexicographically
/// smaller wins).
pub fn resolve_conflict(boundary_id: &str, claims: Vec<SourceClaim>) -> Result<ResolutionDecision, ConflictError> {
    if claims.is_empty() {
        return Err(ConflictError::EmptyConflict);
    }

    if claims.len() == 1 {
        let only = &claims[0];
        return Ok(ResolutionDecision {
            boundary_id: boundary_id.to_string(),
            winner_source_id: only.source_id.clone(),
            reason: "Only source available".to_string(),
            freshness: only.last_modified,
            alternatives_counted: 0,
            timestamp: Utc::now(),
            confidence: 100,
            manual_override: false,
            rejected: Vec::new(),
        });
    }

    let has_primary = claims.iter().any(|c| c.kind.is_primary());
    let (group, rest): (Vec<&SourceClaim>, Vec<&SourceClaim>) = if has_primary {
        claims.iter().partition(|c| c.kind.is_primary())
    } else {
        (claims.iter().collect(), Vec::new())
    };

    let winner = pick_freshest(&group).expect("group is non-empty by construction");

    let mut rejected: Vec<ResolutionReject> = rest
        .iter()
        .chain(group.iter().filter(|c| c.source_id != winner.source_id))
        .map(|claim| ResolutionReject {
            source_id: claim.source_id.clone(),
            reason: reject_reason(has_primary, claim.kind),
            freshness_gap_ms: (winner.last_modified - claim.last_modified).num_milliseconds(),
        })
        .collect();
    rejected.sort_by(|a, b| a.source_id.cmp(&b.source_id));

    let alternatives_counted = claims.len() - 1;
    let confidence = score_confidence(has_primary, winner.last_modified, alternatives_counted);

    Ok(ResolutionDecision {
        boundary_id: boundary_id.to_string(),
        winner_source_id: winner.source_id.clone(),
        reason: format!(
            "{} selected as freshest of {} {}source(s)",
            winner.source_id,
            group.len(),
            if has_primary { "primary " } else { "aggregator " }
        ),
        freshness: winner.last_modified,
        alternatives_counted,
        timestamp: Utc::now(),
        confidence,
        manual_override: false,
        rejected,
    })
}

/// Overrides the automatic resolution: `selected_id` wins unconditionally,
/// with a fixed confidence and a reason prefixed `"MANUAL OVERRIDE: "`.
pub fn create_manual_override(
    boundary_id: &str,
    selected_id: &str,
    sources: &[SourceClaim],
    reason: &str,
) -> Result<ResolutionDecision, ConflictError> {
    let winner = sources
        .iter()
        .find(|c| c.source_id == selected_id)
        .ok_or_else(|| ConflictError::UnknownSource(selected_id.to_string()))?;

    let mut rejected: Vec<ResolutionReject> = sources
        .iter()
        .filter(|c| c.source_id != selected_id)
        .map(|claim| ResolutionReject {
            source_id: claim.source_id.clone(),
            reason: "superseded by manual override".to_string(),
            freshness_gap_ms: (winner.last_modified - claim.last_modified).num_milliseconds(),
        })
        .collect();
    rejected.sort_by(|a, b| a.source_id.cmp(&b.source_id));

    Ok(ResolutionDecision {
        boundary_id: boundary_id.to_string(),
        winner_source_id: winner.source_id.clone(),
        reason: format!("MANUAL OVERRIDE: {reason}"),
        freshness: winner.last_modified,
        alternatives_counted: sources.len().saturating_sub(1),
        timestamp: Utc::now(),
        confidence: 75,
        manual_override: true,
        rejected,
    })
}

/// Sanity-checks a decision before it is allowed to move a head pointer:
/// confidence floor, winner age ceiling, and a non-negative alternative
/// count.
pub fn validate_resolution(decision: &ResolutionDecision) -> bool {
    let age = Utc::now() - decision.freshness;
    decision.confidence >= 50 && age <= chrono::Duration::days(365 * 2)
}

/// Ranks a claim against its peers without the primary/aggregator split —
/// used by state-batch comparisons that only have a preference rank and a
/// freshness score (0.0-1.0, spec §4.2) to go on.
pub fn score(authority_level: u8, preference_rank: u32, freshness_score: f64) -> f64 {
    let preference_rank = preference_rank.min(100);
    authority_level as f64 * 1000.0 + (100 - preference_rank) as f64 * 100.0 + freshness_score * 10.0
}

fn reject_reason(has_primary: bool, kind: SourceKind) -> String {
    if has_primary && !kind.is_primary() {
        "aggregator outranked by an available primary source".to_string()
    } else {
        "not the freshest candidate in its group".to_string()
    }
}

fn pick_freshest<'a>(claims: &[&'a SourceClaim]) -> Option<&'a SourceClaim> {
    claims.iter().copied().reduce(|best, candidate| {
        if is_better(candidate, best) {
            candidate
        } else {
            best
        }
    })
}

/// True if `candidate` beats `current` under the tie-break order: freshest
/// wins, then higher authority level, then lexicographically smaller id.
fn is_better(candidate: &SourceClaim, current: &SourceClaim) -> bool {
    match candidate.last_modified.cmp(&current.last_modified) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => match candidate.authority_level.cmp(&current.authority_level) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => candidate.source_id < current.source_id,
        },
    }
}

fn score_confidence(has_primary: bool, winner_last_modified: DateTime<Utc>, competing: usize) -> u8 {
    let base: i32 = if has_primary { 90 } else { 70 };
    let age_days = (Utc::now() - winner_last_modified).num_days().max(0);
    let age_penalty = ((age_days / 90) as i32).min(20);
    let competition_penalty = 5 * competing as i32;
    (base - age_penalty - competition_penalty).clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadow_atlas_contracts::AuthorityLevel;

    fn claim(id: &str, kind: SourceKind, days_old: i64, authority: u8) -> SourceClaim {
        SourceClaim {
            source_id: id.to_string(),
            source_name: id.to_string(),
            boundary: "CA".to_string(),
            last_modified: Utc::now() - chrono::Duration::days(days_old),
            kind,
            authority_level: AuthorityLevel::new(authority),
            etag: None,
            version: None,
        }
    }

    #[test]
    fn empty_claims_is_an_error() {
        assert!(matches!(resolve_conflict("b1", vec![]), Err(ConflictError::EmptyConflict)));
    }

    #[test]
    fn single_claim_wins_with_full_confidence() {
        let decision = resolve_conflict("b1", vec![claim("s1", SourceKind::Aggregator, 0, 2)]).unwrap();
        assert_eq!(decision.confidence, 100);
        assert_eq!(decision.winner_source_id, "s1");
        assert!(decision.rejected.is_empty());
    }

    #[test]
    fn primary_wins_over_fresher_aggregator() {
        let primary = claim("primary-1", SourceKind::Primary, 30, 4);
        let aggregator = claim("tiger", SourceKind::Aggregator, 1, 2);
        let decision = resolve_conflict("b1", vec![primary, aggregator]).unwrap();
        assert_eq!(decision.winner_source_id, "primary-1");
        assert_eq!(decision.rejected.len(), 1);
        assert_eq!(decision.rejected[0].source_id, "tiger");
    }

    #[test]
    fn freshest_of_two_primaries_wins_tie_break_by_source_id() {
        let mut a = claim("a", SourceKind::Primary, 10, 3);
        let mut b = claim("b", SourceKind::Primary, 10, 3);
        b.last_modified = a.last_modified;
        a.authority_level = b.authority_level;
        let decision = resolve_conflict("b1", vec![a, b]).unwrap();
        assert_eq!(decision.winner_source_id, "a");
    }

    #[test]
    fn manual_override_fixes_confidence_and_prefixes_reason() {
        let sources = vec![claim("a", SourceKind::Primary, 5, 3), claim("b", SourceKind::Aggregator, 1, 2)];
        let decision = create_manual_override("b1", "b", &sources, "county clerk requested it").unwrap();
        assert_eq!(decision.winner_source_id, "b");
        assert_eq!(decision.confidence, 75);
        assert!(decision.manual_override);
        assert!(decision.reason.starts_with("MANUAL OVERRIDE: "));
    }

    #[test]
    fn validate_resolution_rejects_low_confidence() {
        let decision = ResolutionDecision {
            boundary_id: "b1".into(),
            winner_source_id: "s1".into(),
            reason: "test".into(),
            freshness: Utc::now(),
            alternatives_counted: 0,
            timestamp: Utc::now(),
            confidence: 10,
            manual_override: false,
            rejected: vec![],
        };
        assert!(!validate_resolution(&decision));
    }

    #[test]
    fn validate_resolution_rejects_stale_winner() {
        let decision = ResolutionDecision {
            boundary_id: "b1".into(),
            winner_source_id: "s1".into(),
            reason: "test".into(),
            freshness: Utc::now() - chrono::Duration::days(900),
            alternatives_counted: 0,
            timestamp: Utc::now(),
            confidence: 90,
            manual_override: false,
            rejected: vec![],
        };
        assert!(!validate_resolution(&decision));
    }
}
