//! Acquisition Workers (spec §4.9): one `ScraperContract` implementation
//! per source family, sharing a rate-limited, retried HTTP client and a
//! common provenance envelope builder.

mod arcgis;
mod contract;
mod http;
mod osm;
mod portal;
mod provenance;
mod state_gis;

pub use arcgis::ArcGisPortalWorker;
pub use contract::{DatasetProvenance, DatasetResult, GeometryType, ScrapeConfig, ScrapeFailure, ScrapeResult, ScraperContract, ValidationSummary};
pub use http::HttpClient;
pub use osm::OsmOverpassWorker;
pub use portal::SingleEndpointWorker;
pub use state_gis::{StateGisStrategy, StateGisWorker};
