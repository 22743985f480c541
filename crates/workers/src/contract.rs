//! The `ScraperContract` every source-family worker implements, plus the
//! shapes it produces (spec §4.9).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shadow_atlas_resilience::TokenBucketConfig;

/// Per-call HTTP discipline a worker applies to its own requests.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub max_parallel: usize,
    pub rate_limit: TokenBucketConfig,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub backoff_multiplier: f64,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_parallel: 5,
            rate_limit: TokenBucketConfig::default(),
            timeout_ms: 15_000,
            max_retries: 3,
            backoff_multiplier: 2.0,
            user_agent: format!("Shadow-Atlas-Acquisition/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum GeometryType {
    Polygon,
    MultiPolygon,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub confidence: u8,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Carried alongside every successfully scraped dataset (spec §4.9); the
/// validator and provenance writer both read this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetProvenance {
    pub source: String,
    pub authority: String,
    pub jurisdiction: String,
    pub timestamp: DateTime<Utc>,
    pub source_last_modified: Option<DateTime<Utc>>,
    pub method: String,
    pub response_sha256: String,
    pub http_status: u16,
    pub license: Option<String>,
    pub feature_count: u64,
    pub geometry_type: GeometryType,
    pub coordinate_system: String,
    pub validation: ValidationSummary,
}

#[derive(Debug, Clone)]
pub struct DatasetResult {
    pub payload: Value,
    pub provenance: DatasetProvenance,
}

#[derive(Debug, Clone)]
pub struct ScrapeFailure {
    pub source: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScrapeResult {
    pub datasets: Vec<DatasetResult>,
    pub failures: Vec<ScrapeFailure>,
    pub execution_time_ms: u64,
}

/// Every source-family handler implements this. Implementations must never
/// panic or propagate an error out of `scrape_all` — per-source failures go
/// into `ScrapeResult::failures` (spec §7).
#[async_trait]
pub trait ScraperContract: Send + Sync {
    async fn scrape_all(&self, config: &ScrapeConfig) -> ScrapeResult;
}
