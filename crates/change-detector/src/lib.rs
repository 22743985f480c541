//! Enhanced Change Detector (spec §4.5): combines a HEAD-based freshness
//! check with the validity-window confidence model and the redistricting
//! gap detector to decide, per source, whether a download is warranted —
//! plus the priority queue and confidence-based scheduler built on top of
//! its output.

mod classify;
mod detector;
mod scheduler;

pub use classify::{
    get_refresh_priority, priority_for, staleness_days, ChangeAssessment, ChangeKind, Priority, RefreshPriority,
    SuggestedAction,
};
pub use detector::detect_changes_with_freshness;
pub use scheduler::{schedule_confidence_based_refresh, ScheduleResult, ScoredSource};
