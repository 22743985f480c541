//! Primary-Source Comparator (spec §4.4): cheap HTTP HEAD comparisons
//! between a primary authority and TIGER.

use chrono::{DateTime, Datelike, Utc};
use futures::future::join_all;
use reqwest::Client;
use shadow_atlas_contracts::{BoundaryType, Jurisdiction};
use shadow_atlas_registry::SourceRegistry;
use shadow_atlas_resilience::{RetryConfig, RetryExecutor};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FreshnessCheck {
    pub available: bool,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    pub content_length: Option<u64>,
    pub checked_at: DateTime<Utc>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TigerRecommendation {
    UseTiger,
    UsePrimary,
}

#[derive(Debug, Clone)]
pub struct TigerComparison {
    pub tiger_is_fresh: bool,
    pub recommendation: TigerRecommendation,
    pub warning: Option<String>,
    pub lag_days: Option<i64>,
}

pub struct PrimarySourceComparator {
    client: Client,
    registry: std::sync::Arc<SourceRegistry>,
}

impl PrimarySourceComparator {
    pub fn new(registry: std::sync::Arc<SourceRegistry>) -> Self {
        Self { client: Client::new(), registry }
    }

    /// HTTP HEAD with a 5 s timeout, up to 3 attempts with exponential
    /// backoff (initial 1 s, factor 2, cap 10 s).
    pub async fn check_source_freshness(&self, url: &str) -> FreshnessCheck {
        let checked_at = Utc::now();
        let config = RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            ..Default::default()
        };
        let executor = RetryExecutor::with_default_policy(config);
        let client = self.client.clone();
        let url = url.to_string();

        let result = executor
            .execute(move || {
                let client = client.clone();
                let url = url.clone();
                Box::pin(async move { client.head(&url).timeout(Duration::from_secs(5)).send().await })
            })
            .await;

        match result {
            Ok(response) => {
                let headers = response.headers();
                let last_modified = headers
                    .get(reqwest::header::LAST_MODIFIED)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
                    .map(|dt| dt.with_timezone(&Utc));
                let etag = headers.get(reqwest::header::ETAG).and_then(|v| v.to_str().ok()).map(str::to_string);
                let content_length = response.content_length();
                FreshnessCheck { available: true, last_modified, etag, content_length, checked_at, error: None }
            }
            Err(err) => FreshnessCheck {
                available: false,
                last_modified: None,
                etag: None,
                content_length: None,
                checked_at,
                error: Some(err.to_string()),
            },
        }
    }

    pub async fn compare_tiger_freshness(
        &self,
        boundary_type: BoundaryType,
        jurisdiction: &Jurisdiction,
    ) -> TigerComparison {
        let primary_sources = self.registry.get_primary_sources_for_state(jurisdiction.as_str());
        let primary = match primary_sources.iter().find(|s| s.boundary_type == boundary_type) {
            None => {
                return TigerComparison {
                    tiger_is_fresh: true,
                    recommendation: TigerRecommendation::UseTiger,
                    warning: None,
                    lag_days: None,
                }
            }
            Some(source) => source,
        };

        if !primary.machine_readable {
            return TigerComparison {
                tiger_is_fresh: true,
                recommendation: TigerRecommendation::UseTiger,
                warning: Some(format!("primary source {} is not machine-readable", primary.id)),
                lag_days: None,
            };
        }

        let aggregator = self
            .registry
            .get_aggregator_sources(boundary_type)
            .into_iter()
            .next();

        let current_year = Utc::now().year();
        let primary_check = self.check_source_freshness(&primary.url.resolve(current_year)).await;
        let tiger_check = match &aggregator {
            Some(agg) => self.check_source_freshness(&agg.url.resolve(current_year)).await,
            None => {
                return TigerComparison {
                    tiger_is_fresh: true,
                    recommendation: TigerRecommendation::UseTiger,
                    warning: None,
                    lag_days: None,
                }
            }
        };

        match (primary_check.last_modified, tiger_check.last_modified) {
            (Some(primary_lm), Some(tiger_lm)) if primary_lm > tiger_lm => TigerComparison {
                tiger_is_fresh: false,
                recommendation: TigerRecommendation::UsePrimary,
                warning: None,
                lag_days: Some((primary_lm - tiger_lm).num_days()),
            },
            _ => TigerComparison {
                tiger_is_fresh: true,
                recommendation: TigerRecommendation::UseTiger,
                warning: None,
                lag_days: None,
            },
        }
    }

    /// Runs `compare_tiger_freshness` for every state known to the
    /// registry, bounded by `max_parallel` concurrent comparisons.
    pub async fn compare_all_states(&self, boundary_type: BoundaryType, max_parallel: usize) -> Vec<(String, TigerComparison)> {
        let states = self.registry.get_states_with_primary_sources();
        let mut results = Vec::with_capacity(states.len());
        for chunk in states.chunks(max_parallel.max(1)) {
            let futures = chunk.iter().map(|state| {
                let jurisdiction = Jurisdiction::new(state.clone());
                async move {
                    let comparison = self.compare_tiger_freshness(boundary_type, &jurisdiction).await;
                    (state.clone(), comparison)
                }
            });
            results.extend(join_all(futures).await);
        }
        results
    }
}
