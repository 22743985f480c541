//! Freshness math for the acquisition pipeline: validity-window confidence
//! (spec §4.2), redistricting gap detection (spec §4.3), and the
//! primary-vs-TIGER HTTP comparator (spec §4.4).

pub mod comparator;
pub mod gap;
pub mod window;

pub use comparator::{FreshnessCheck, PrimarySourceComparator, TigerComparison, TigerRecommendation};
pub use gap::{BoundaryGapStatus, CycleInfo, GapDetector, GapRecommendation, GapType, StateGapSummary};
pub use window::{confidence, expiration_warning};
