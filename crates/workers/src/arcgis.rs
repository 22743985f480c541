//! ArcGIS Portal worker (spec §4.9, §6): global search over `/sharing/rest/search`,
//! feature-service metadata lookup for the polygon layer, then a GeoJSON
//! layer query.

use crate::contract::{DatasetResult, ScrapeConfig, ScrapeFailure, ScrapeResult, ScraperContract};
use crate::http::HttpClient;
use crate::provenance;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Instant;

const POLYGON_GEOMETRY_TYPES: &[&str] = &["esriGeometryPolygon", "Polygon", "esriGeometryMultiPolygon"];

pub struct ArcGisPortalWorker {
    pub base_url: String,
    pub query: String,
    pub jurisdiction: String,
    pub authority: String,
    pub license: Option<String>,
    /// Upper bound on search result pages fetched; the portal API paginates
    /// via `nextStart` indefinitely for broad queries.
    pub max_pages: usize,
}

impl ArcGisPortalWorker {
    pub fn new(base_url: impl Into<String>, query: impl Into<String>, jurisdiction: impl Into<String>, authority: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            query: query.into(),
            jurisdiction: jurisdiction.into(),
            authority: authority.into(),
            license: None,
            max_pages: 5,
        }
    }

    async fn search_results(&self, http: &HttpClient) -> Result<Vec<Value>, String> {
        let mut results = Vec::new();
        let mut start = 1i64;
        for _ in 0..self.max_pages {
            let url = format!(
                "{}/sharing/rest/search?q={}&f=json&num=100&start={}&sortField=modified&sortOrder=desc",
                self.base_url, self.query, start
            );
            let response = http.get(&url).await.map_err(|e| e.to_string())?;
            let body: Value = response.json().await.map_err(|e| e.to_string())?;
            if let Some(page) = body.get("results").and_then(Value::as_array) {
                results.extend(page.clone());
            }
            match body.get("nextStart").and_then(Value::as_i64) {
                Some(next) if next > 0 => start = next,
                _ => break,
            }
        }
        Ok(results)
    }

    async fn polygon_layer(&self, http: &HttpClient, service_url: &str) -> Result<Option<(i64, String)>, String> {
        let response = http.get(&format!("{service_url}?f=json")).await.map_err(|e| e.to_string())?;
        let body: Value = response.json().await.map_err(|e| e.to_string())?;
        let layers = body.get("layers").and_then(Value::as_array).cloned().unwrap_or_default();
        for layer in layers {
            let geometry_type = layer.get("geometryType").and_then(Value::as_str).unwrap_or("");
            if POLYGON_GEOMETRY_TYPES.contains(&geometry_type) {
                let id = layer.get("id").and_then(Value::as_i64).unwrap_or(0);
                let name = layer.get("name").and_then(Value::as_str).unwrap_or("").to_string();
                return Ok(Some((id, name)));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl ScraperContract for ArcGisPortalWorker {
    async fn scrape_all(&self, config: &ScrapeConfig) -> ScrapeResult {
        let start = Instant::now();
        let http = HttpClient::new(config.rate_limit, &config.user_agent, config.timeout_ms, config.max_retries, config.backoff_multiplier);

        let mut datasets = Vec::new();
        let mut failures = Vec::new();

        let results = match self.search_results(&http).await {
            Ok(results) => results,
            Err(error) => {
                return ScrapeResult {
                    datasets,
                    failures: vec![ScrapeFailure { source: self.base_url.clone(), error }],
                    execution_time_ms: start.elapsed().as_millis() as u64,
                }
            }
        };

        for result in results {
            let title = result.get("title").and_then(Value::as_str).unwrap_or("unknown").to_string();
            let service_url = match result.get("url").and_then(Value::as_str) {
                Some(url) => url.to_string(),
                None => continue,
            };
            let modified = result
                .get("modified")
                .and_then(Value::as_i64)
                .and_then(DateTime::<Utc>::from_timestamp_millis);

            let layer = match self.polygon_layer(&http, &service_url).await {
                Ok(Some(layer)) => layer,
                Ok(None) => continue,
                Err(error) => {
                    failures.push(ScrapeFailure { source: title, error });
                    continue;
                }
            };

            let query_url = format!("{}/{}/query?where=1=1&outFields=*&f=geojson&returnGeometry=true", service_url, layer.0);
            match http.get(&query_url).await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    match response.bytes().await {
                        Ok(body) => match serde_json::from_slice::<Value>(&body) {
                            Ok(payload) => {
                                let dataset_provenance = provenance::build(
                                    &title,
                                    &self.authority,
                                    &self.jurisdiction,
                                    "arcgis-layer-query",
                                    &body,
                                    &payload,
                                    status,
                                    modified,
                                    self.license.clone(),
                                );
                                datasets.push(DatasetResult { payload, provenance: dataset_provenance });
                            }
                            Err(error) => failures.push(ScrapeFailure { source: title, error: error.to_string() }),
                        },
                        Err(error) => failures.push(ScrapeFailure { source: title, error: error.to_string() }),
                    }
                }
                Err(error) => failures.push(ScrapeFailure { source: title, error: error.to_string() }),
            }
        }

        ScrapeResult { datasets, failures, execution_time_ms: start.elapsed().as_millis() as u64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_every_documented_polygon_geometry_type() {
        for kind in POLYGON_GEOMETRY_TYPES {
            assert!(POLYGON_GEOMETRY_TYPES.contains(kind));
        }
        assert!(!POLYGON_GEOMETRY_TYPES.contains(&"esriGeometryPoint"));
    }
}
