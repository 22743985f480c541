//! Known-municipal-portal and direct-map-server workers (spec §4.9). Both
//! are a single GeoJSON endpoint fetch; they differ only in how that
//! endpoint was discovered, so they share one implementation here.

use crate::contract::{DatasetResult, ScrapeConfig, ScrapeFailure, ScrapeResult, ScraperContract};
use crate::http::HttpClient;
use crate::provenance;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Instant;

pub struct SingleEndpointWorker {
    pub name: String,
    pub authority: String,
    pub jurisdiction: String,
    pub url: String,
    pub license: Option<String>,
}

impl SingleEndpointWorker {
    pub fn new(name: impl Into<String>, authority: impl Into<String>, jurisdiction: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: name.into(), authority: authority.into(), jurisdiction: jurisdiction.into(), url: url.into(), license: None }
    }
}

#[async_trait]
impl ScraperContract for SingleEndpointWorker {
    async fn scrape_all(&self, config: &ScrapeConfig) -> ScrapeResult {
        let start = Instant::now();
        let http = HttpClient::new(config.rate_limit, &config.user_agent, config.timeout_ms, config.max_retries, config.backoff_multiplier);

        let (datasets, failures) = match http.get(&self.url).await {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.bytes().await {
                    Ok(body) => match serde_json::from_slice::<Value>(&body) {
                        Ok(payload) => {
                            let dataset_provenance =
                                provenance::build(&self.name, &self.authority, &self.jurisdiction, "single-endpoint-fetch", &body, &payload, status, None, self.license.clone());
                            (vec![DatasetResult { payload, provenance: dataset_provenance }], Vec::new())
                        }
                        Err(error) => (Vec::new(), vec![ScrapeFailure { source: self.name.clone(), error: error.to_string() }]),
                    },
                    Err(error) => (Vec::new(), vec![ScrapeFailure { source: self.name.clone(), error: error.to_string() }]),
                }
            }
            Err(error) => (Vec::new(), vec![ScrapeFailure { source: self.name.clone(), error: error.to_string() }]),
        };

        ScrapeResult { datasets, failures, execution_time_ms: start.elapsed().as_millis() as u64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_preserves_identifying_fields() {
        let worker = SingleEndpointWorker::new("Springfield", "Springfield GIS", "IL", "https://gis.springfield.example/boundary.geojson");
        assert_eq!(worker.name, "Springfield");
        assert_eq!(worker.jurisdiction, "IL");
        assert!(worker.license.is_none());
    }
}
