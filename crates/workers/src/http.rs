//! Shared rate-limited, retried HTTP GET used by every source-family
//! worker (spec §4.9, §5).

use shadow_atlas_resilience::{RetryConfig, RetryError, RetryExecutor, TokenBucket, TokenBucketConfig};
use std::time::Duration;

pub struct HttpClient {
    client: reqwest::Client,
    bucket: TokenBucket,
    timeout: Duration,
    max_retries: u32,
    backoff_multiplier: f64,
}

impl HttpClient {
    pub fn new(rate_limit: TokenBucketConfig, user_agent: &str, timeout_ms: u64, max_retries: u32, backoff_multiplier: f64) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .build()
            .expect("reqwest client builder with a static user agent never fails");
        Self {
            client,
            bucket: TokenBucket::new(rate_limit),
            timeout: Duration::from_millis(timeout_ms),
            max_retries,
            backoff_multiplier,
        }
    }

    /// Token-bucket-gated GET with exponential-backoff retry.
    pub async fn get(&self, url: &str) -> Result<reqwest::Response, RetryError> {
        self.bucket.acquire().await;
        let config = RetryConfig { max_attempts: self.max_retries, backoff_multiplier: self.backoff_multiplier, ..Default::default() };
        let executor = RetryExecutor::with_default_policy(config);
        let client = self.client.clone();
        let url = url.to_string();
        let timeout = self.timeout;
        executor
            .execute(move || {
                let client = client.clone();
                let url = url.clone();
                Box::pin(async move { client.get(&url).timeout(timeout).send().await })
            })
            .await
    }

    /// Conditional GET with `If-None-Match`; callers treat a 304 response
    /// as unchanged without re-downloading the body (spec §6).
    pub async fn get_conditional(&self, url: &str, etag: Option<&str>) -> Result<reqwest::Response, RetryError> {
        self.bucket.acquire().await;
        let config = RetryConfig { max_attempts: self.max_retries, backoff_multiplier: self.backoff_multiplier, ..Default::default() };
        let executor = RetryExecutor::with_default_policy(config);
        let client = self.client.clone();
        let url = url.to_string();
        let timeout = self.timeout;
        let etag = etag.map(str::to_string);
        executor
            .execute(move || {
                let client = client.clone();
                let url = url.clone();
                let etag = etag.clone();
                Box::pin(async move {
                    let mut request = client.get(&url).timeout(timeout);
                    if let Some(etag) = &etag {
                        request = request.header(reqwest::header::IF_NONE_MATCH, etag.as_str());
                    }
                    request.send().await
                })
            })
            .await
    }
}
