//! Structured logging setup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

/// Initializes the global tracing subscriber. Honors `SHADOW_ATLAS_LOG`
/// (falling back to `RUST_LOG`, then `info`) for filtering, matching the
/// env-filter convention used across the rest of the workspace.
pub fn init_tracing(service_name: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_env("SHADOW_ATLAS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => {
            let layer = fmt::layer().json().with_current_span(false).with_span_list(false);
            subscriber.with(layer).init();
        }
        LogFormat::Pretty => {
            subscriber.with(fmt::layer().pretty()).init();
        }
        LogFormat::Compact => {
            subscriber.with(fmt::layer().compact()).init();
        }
    }

    tracing::info!(service = service_name, format = ?format, "tracing initialized");
}
