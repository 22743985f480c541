//! OSM Overpass-style worker (spec §4.9): country-chunked queries against
//! an Overpass API mirror. Global queries run hot and slow, so each chunk
//! gets a generous timeout independent of the worker's own `ScrapeConfig`.

use crate::contract::{DatasetResult, ScrapeConfig, ScrapeFailure, ScrapeResult, ScraperContract};
use crate::http::HttpClient;
use crate::provenance;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Instant;

const OVERPASS_MIN_TIMEOUT_MS: u64 = 180_000;

pub struct OsmOverpassWorker {
    pub endpoint: String,
    pub authority: String,
    pub jurisdiction: String,
    pub countries: Vec<String>,
    pub query_template: String,
    pub license: Option<String>,
}

impl OsmOverpassWorker {
    pub fn new(endpoint: impl Into<String>, authority: impl Into<String>, jurisdiction: impl Into<String>, countries: Vec<String>, query_template: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), authority: authority.into(), jurisdiction: jurisdiction.into(), countries, query_template: query_template.into(), license: Some("ODbL".to_string()) }
    }

    fn query_for(&self, country: &str) -> String {
        self.query_template.replace("{country}", country)
    }
}

#[async_trait]
impl ScraperContract for OsmOverpassWorker {
    async fn scrape_all(&self, config: &ScrapeConfig) -> ScrapeResult {
        let start = Instant::now();
        let timeout_ms = config.timeout_ms.max(OVERPASS_MIN_TIMEOUT_MS);
        let http = HttpClient::new(config.rate_limit, &config.user_agent, timeout_ms, config.max_retries, config.backoff_multiplier);

        let mut datasets = Vec::new();
        let mut failures = Vec::new();

        for country in &self.countries {
            let query = self.query_for(country);
            let url = format!("{}?data={}", self.endpoint, urlencoding_minimal(&query));
            match http.get(&url).await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    match response.bytes().await {
                        Ok(body) => match serde_json::from_slice::<Value>(&body) {
                            Ok(payload) => {
                                let dataset_provenance = provenance::build(country, &self.authority, &self.jurisdiction, "overpass-query", &body, &payload, status, None, self.license.clone());
                                datasets.push(DatasetResult { payload, provenance: dataset_provenance });
                            }
                            Err(error) => failures.push(ScrapeFailure { source: country.clone(), error: error.to_string() }),
                        },
                        Err(error) => failures.push(ScrapeFailure { source: country.clone(), error: error.to_string() }),
                    }
                }
                Err(error) => failures.push(ScrapeFailure { source: country.clone(), error: error.to_string() }),
            }
        }

        ScrapeResult { datasets, failures, execution_time_ms: start.elapsed().as_millis() as u64 }
    }
}

/// Percent-encodes the characters Overpass query strings actually contain;
/// not a general-purpose URL encoder.
fn urlencoding_minimal(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' => out.push(ch),
            ' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", ch as u32)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_template_substitutes_country() {
        let worker = OsmOverpassWorker::new("https://overpass.example/api/interpreter", "OpenStreetMap", "*", vec!["US".to_string()], "area[\"ISO3166-1\"=\"{country}\"];".to_string());
        assert_eq!(worker.query_for("US"), "area[\"ISO3166-1\"=\"US\"];");
    }

    #[test]
    fn timeout_floor_is_enforced() {
        let config = ScrapeConfig { timeout_ms: 5_000, ..Default::default() };
        assert_eq!(config.timeout_ms.max(OVERPASS_MIN_TIMEOUT_MS), OVERPASS_MIN_TIMEOUT_MS);
    }

    #[test]
    fn minimal_encoder_escapes_space_and_brackets() {
        assert_eq!(urlencoding_minimal("a b"), "a+b");
        assert_eq!(urlencoding_minimal("[out:json]"), "%5Bout%3Ajson%5D");
    }
}
