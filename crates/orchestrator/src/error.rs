//! Orchestrator-level error type (spec §7): wraps the lower crates'
//! errors and maps every variant onto [`AcquisitionError`]'s recoverable /
//! non-recoverable taxonomy.

use shadow_atlas_contracts::AcquisitionError;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("storage failure: {0}")]
    Storage(#[from] shadow_atlas_storage::StorageError),
    #[error("conflict resolution failure: {0}")]
    Conflict(#[from] shadow_atlas_conflict_resolver::ConflictError),
    #[error("registry failure: {0}")]
    Registry(#[from] shadow_atlas_registry::RegistryError),
    #[error("config failure: {0}")]
    Config(#[from] shadow_atlas_config::ConfigError),
}

impl OrchestratorError {
    /// Only a storage-layer or registry-init failure aborts a run (spec
    /// §7); everything else is a per-source error accumulated in `errors[]`.
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(self, OrchestratorError::Storage(_) | OrchestratorError::Registry(_) | OrchestratorError::Config(_))
    }
}

/// `(recoverable, message)` for a source-level error entry in a run report.
pub fn classify(error: &AcquisitionError) -> (bool, String) {
    (error.is_recoverable(), error.to_string())
}
