//! CLI entry point (spec §6): `incremental` (default), `full`, `force`,
//! `change-check:*`. Exit codes: `0` success, `1` fatal error, `2` invalid
//! invocation. A fatal error emits a single JSON line on stderr before exit.

use clap::{Parser, Subcommand};
use shadow_atlas_contracts::{AcquisitionError, BoundaryType, Jurisdiction};
use shadow_atlas_freshness::comparator::PrimarySourceComparator;
use shadow_atlas_freshness::gap::GapDetector;
use shadow_atlas_orchestrator::{Downloader, Orchestrator, PassThroughMuniIdMapper, RawDownload, SourceTracker};
use shadow_atlas_registry::SourceRegistry;
use shadow_atlas_storage::Store;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "shadow-atlas", about = "Boundary acquisition orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Scheduled change detection and incremental refresh (default).
    Incremental,
    /// Quarterly full snapshot of every tracked municipality.
    Full,
    /// Incremental, bypassing the schedule.
    Force,
    /// Diagnostic change-check modes; none perform a write.
    ChangeCheck {
        #[arg(default_value = "daily")]
        mode: String,
    },
}

struct ReqwestDownloader {
    client: reqwest::Client,
}

#[async_trait::async_trait]
impl Downloader for ReqwestDownloader {
    async fn download(&self, url: &str) -> Result<RawDownload, AcquisitionError> {
        let response = self.client.get(url).send().await.map_err(|e| AcquisitionError::NetworkTransient(e.to_string()))?;
        let etag = response.headers().get(reqwest::header::ETAG).and_then(|v| v.to_str().ok()).map(str::to_string);
        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| chrono::DateTime::parse_from_rfc2822(v).ok())
            .map(|d| d.with_timezone(&chrono::Utc));
        if !response.status().is_success() {
            return Err(AcquisitionError::NetworkPermanent(format!("HTTP {}", response.status())));
        }
        let payload: serde_json::Value = response.json().await.map_err(|e| AcquisitionError::SchemaViolation(e.to_string()))?;
        Ok(RawDownload { payload, source_name: url.to_string(), etag, last_modified })
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match shadow_atlas_config::AppConfig::load(Some(&cli.config)) {
        Ok(config) => config,
        Err(error) => fatal(&error.to_string()),
    };

    shadow_atlas_observability::init_tracing("shadow-atlas-orchestrator", shadow_atlas_observability::LogFormat::Compact);

    let store = match Store::connect(&config.database).await {
        Ok(store) => store,
        Err(error) => fatal(&error.to_string()),
    };

    let registry = SourceRegistry::seeded();
    let comparator = PrimarySourceComparator::new(Arc::new(SourceRegistry::seeded()));
    let gap_detector = GapDetector::seeded();
    let tracker = SourceTracker::new();
    let mapper = PassThroughMuniIdMapper;
    let downloader = ReqwestDownloader { client: reqwest::Client::builder().user_agent(config.scraper.user_agent.clone()).build().unwrap_or_default() };

    let orchestrator = Orchestrator {
        registry: &registry,
        comparator: &comparator,
        gap_detector: &gap_detector,
        store: &store,
        downloader: &downloader,
        muni_mapper: &mapper,
        tracker: &tracker,
        max_concurrent_downloads: config.orchestrator.max_concurrent_downloads,
    };

    let scopes: Vec<(BoundaryType, Jurisdiction)> = BoundaryType::ALL.iter().map(|bt| (*bt, Jurisdiction::wildcard())).collect();

    match cli.command.unwrap_or(Command::Incremental) {
        Command::Incremental => {
            let report = orchestrator.run_incremental_refresh(&scopes).await;
            print_summary(report.sources_checked, report.sources_changed, report.boundaries_updated.len(), report.errors.len(), &report.run_id);
        }
        Command::Force => {
            let report = orchestrator.force_check_all(&scopes).await;
            print_summary(report.sources_checked, report.sources_changed, report.boundaries_updated.len(), report.errors.len(), &report.run_id);
        }
        Command::Full => match orchestrator.run_full_snapshot(config.orchestrator.max_concurrent_downloads as i64).await {
            Ok(report) => {
                println!(
                    "{}",
                    serde_json::json!({
                        "municipalitiesProcessed": report.municipalities_processed,
                        "boundariesUpdated": report.boundaries_updated.len(),
                        "errors": report.errors.len(),
                        "snapshotHash": report.snapshot_hash,
                        "runId": report.run_id,
                    })
                );
            }
            Err(error) => fatal(&error.to_string()),
        },
        Command::ChangeCheck { mode } => {
            println!("change-check:{mode} is diagnostic-only; no sources were modified");
        }
    }
}

fn print_summary(checked: usize, changed: usize, updated: usize, errors: usize, run_id: &str) {
    println!(
        "{}",
        serde_json::json!({"checked": checked, "changed": changed, "updated": updated, "errors": errors, "runId": run_id})
    );
}

fn fatal(message: &str) -> ! {
    eprintln!("{}", serde_json::json!({"fatal": true, "error": message}));
    std::process::exit(1);
}
