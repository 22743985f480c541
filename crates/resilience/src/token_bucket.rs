//! Token-bucket rate limiting for outbound requests to a source family.
//!
//! Each worker holds one bucket per upstream (ArcGIS Portal, State GIS,
//! OSM-like Overpass, municipal portal). `acquire()` suspends the caller
//! until a token is available rather than rejecting the request.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenBucketConfig {
    /// Sustained requests per second.
    pub requests_per_second: f64,
    /// Burst capacity; defaults to `requests_per_second.ceil()` if not set explicitly.
    pub burst: u32,
}

impl TokenBucketConfig {
    pub fn arcgis_portal() -> Self {
        Self { requests_per_second: 10.0, burst: 10 }
    }

    pub fn state_gis() -> Self {
        Self { requests_per_second: 5.0, burst: 5 }
    }

    pub fn osm_overpass() -> Self {
        Self { requests_per_second: 1.0, burst: 1 }
    }

    pub fn municipal_portal() -> Self {
        Self { requests_per_second: 2.0, burst: 2 }
    }
}

impl Default for TokenBucketConfig {
    fn default() -> Self {
        Self { requests_per_second: 5.0, burst: 5 }
    }
}

struct State {
    tokens: f64,
    last_refill: Instant,
}

/// A single shared rate limiter. Cloning shares the same bucket.
#[derive(Clone)]
pub struct TokenBucket {
    config: TokenBucketConfig,
    state: Arc<Mutex<State>>,
}

impl TokenBucket {
    pub fn new(config: TokenBucketConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(State {
                tokens: config.burst as f64,
                last_refill: Instant::now(),
            })),
        }
    }

    /// Blocks until a token is available, then consumes it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    let deficit = 1.0 - state.tokens;
                    Some(Duration::from_secs_f64(deficit / self.config.requests_per_second))
                }
            };
            match wait {
                None => return,
                Some(duration) => tokio::time::sleep(duration).await,
            }
        }
    }

    fn refill(&self, state: &mut State) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.config.requests_per_second)
            .min(self.config.burst as f64);
        state.last_refill = now;
    }

    /// Current token count, for diagnostics and tests.
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_with_full_burst() {
        let bucket = TokenBucket::new(TokenBucketConfig { requests_per_second: 10.0, burst: 3 });
        assert!(bucket.available().await >= 2.9);
    }

    #[tokio::test]
    async fn acquire_drains_then_refills() {
        let bucket = TokenBucket::new(TokenBucketConfig { requests_per_second: 100.0, burst: 1 });
        bucket.acquire().await;
        let drained = bucket.available().await;
        assert!(drained < 0.5);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let refilled = bucket.available().await;
        assert!(refilled > drained);
    }

    #[tokio::test]
    async fn second_acquire_waits_when_exhausted() {
        let bucket = TokenBucket::new(TokenBucketConfig { requests_per_second: 50.0, burst: 1 });
        bucket.acquire().await;
        let start = Instant::now();
        bucket.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn source_family_defaults_are_distinct() {
        assert!(TokenBucketConfig::arcgis_portal().requests_per_second > TokenBucketConfig::state_gis().requests_per_second);
        assert!(TokenBucketConfig::state_gis().requests_per_second > TokenBucketConfig::osm_overpass().requests_per_second);
    }
}
