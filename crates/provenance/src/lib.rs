//! Append-only provenance log: per-FIPS-shard (by state) gzipped NDJSON in
//! standard mode, per-agent staging files merged in background in staging
//! mode (spec §4.8). Entries never mutate after write.

mod merge;
mod query;
mod shard;
mod writer;

pub use merge::MergeReport;
pub use query::{ProvenanceQuery, ProvenanceStats};
pub use writer::{ProvenanceWriter, WriteMode};

#[derive(Debug, thiserror::Error)]
pub enum ProvenanceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("background task join error: {0}")]
    Join(String),
}
