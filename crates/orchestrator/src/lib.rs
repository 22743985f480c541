//! Incremental Orchestrator (spec §4.10): wires the registry, freshness
//! comparator, gap detector, change detector, conflict resolver, validator,
//! and storage layer into the three run modes and the commit protocol.

mod commit;
mod error;
mod pipeline;
mod run_id;
mod sources;

pub use commit::{canonical_content_sha256, commit_download, decide_commit, CommitOutcome, DownloadResult};
pub use error::{classify, OrchestratorError};
pub use pipeline::{
    snapshot_hash, Downloader, FullSnapshotReport, IncrementalReport, MuniIdMapper, Orchestrator, PassThroughMuniIdMapper, RawDownload, RunError,
};
pub use run_id::generate_run_id;
pub use sources::SourceTracker;
