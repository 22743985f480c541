//! Wires the pure classification rules in [`crate::classify`] to a live
//! HEAD check, the validity-window confidence model, and the redistricting
//! gap detector (spec §4.5).

use crate::classify::{self, ChangeAssessment, ChangeKind};
use chrono::Utc;
use shadow_atlas_contracts::{BoundaryType, CanonicalSource, Jurisdiction, SourceKind};
use shadow_atlas_freshness::comparator::PrimarySourceComparator;
use shadow_atlas_freshness::gap::GapDetector;
use shadow_atlas_freshness::window;
use shadow_atlas_registry::SourceRegistry;

/// Scans every tracked source for a boundary type/jurisdiction and
/// produces a per-source change assessment.
pub async fn detect_changes_with_freshness(
    comparator: &PrimarySourceComparator,
    registry: &SourceRegistry,
    gap_detector: &GapDetector,
    boundary_type: BoundaryType,
    jurisdiction: &Jurisdiction,
    sources: &[CanonicalSource],
) -> Vec<ChangeAssessment> {
    let now = Utc::now();
    let authority = registry.get_authority(boundary_type).ok();
    let gap_status = gap_detector.check_boundary_gap(boundary_type, jurisdiction.as_str(), now);
    let gap_recommends_primary = matches!(gap_status.recommendation, shadow_atlas_freshness::gap::GapRecommendation::UsePrimary);
    let gap_lag_days = gap_status
        .finalization_info
        .as_ref()
        .map(|info| (now - info.effective_date).num_days().max(0))
        .unwrap_or(0);

    let mut assessments = Vec::with_capacity(sources.len());
    for source in sources {
        let kind = authority
            .and_then(|entry| {
                entry
                    .primary_sources
                    .iter()
                    .chain(entry.aggregator_sources.iter())
                    .find(|d| d.id == source.id)
            })
            .map(|d| d.kind)
            .unwrap_or(SourceKind::Aggregator);

        let check = comparator.check_source_freshness(&source.url).await;

        // An unreachable HEAD is never surfaced as a download candidate
        // (spec §4.5): treat it as unchanged rather than erroring.
        if !check.available {
            assessments.push(ChangeAssessment {
                source_id: source.id.clone(),
                has_changed: false,
                change_type: ChangeKind::None,
                confidence: 1.0,
                in_redistricting_gap: gap_status.in_gap,
                last_checked: source.last_checked,
                suggested_action: classify::SuggestedAction::NoAction,
                reasoning: format!("source unreachable ({}); treated as unchanged", check.error.unwrap_or_default()),
            });
            continue;
        }

        let new_checksum = check.etag.clone().or_else(|| check.last_modified.map(|d| d.to_rfc3339()));
        let header_changed = match &new_checksum {
            Some(checksum) => source.last_checksum.as_deref() != Some(checksum.as_str()),
            None => false,
        };

        let release_date = check.last_modified.or(source.last_checked).unwrap_or(now);
        let confidence = window::confidence(kind, boundary_type, release_date, now);

        let (change_type, has_changed) = classify::classify_change(header_changed, confidence);
        let (suggested_action, reasoning) =
            classify::suggest_action(change_type, confidence, gap_recommends_primary, gap_lag_days);

        assessments.push(ChangeAssessment {
            source_id: source.id.clone(),
            has_changed,
            change_type,
            confidence,
            in_redistricting_gap: gap_status.in_gap,
            last_checked: source.last_checked,
            suggested_action,
            reasoning,
        });
    }
    assessments
}
