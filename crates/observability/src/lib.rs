//! Logging and metrics for the acquisition pipeline.
//!
//! - Structured logging with tracing
//! - A small Prometheus-backed run metrics registry

pub mod logging;
pub mod metrics;

pub use logging::{init_tracing, LogFormat};
pub use metrics::RunMetrics;
