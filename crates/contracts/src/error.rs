//! Error taxonomy shared across the acquisition pipeline (spec §7).
//!
//! This is a *kind* taxonomy, not a catch-all error type: crates still
//! define their own `thiserror` enums for local detail, but every one of
//! them maps into one of these kinds at the point where the orchestrator or
//! a worker has to decide whether something is recoverable.

use std::fmt;

/// Kinds of failure the acquisition pipeline distinguishes for retry and
/// recovery purposes.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AcquisitionError {
    /// Timeouts, connection resets, 5xx, 429. Retried per backoff policy;
    /// surfaced as recoverable once retries are exhausted.
    #[error("transient network failure: {0}")]
    NetworkTransient(String),

    /// DNS failure, 404 on a registered source URL, TLS failure.
    /// Non-recoverable; the source is marked unhealthy for the run.
    #[error("permanent network failure: {0}")]
    NetworkPermanent(String),

    /// Payload parses but fails structural validation. Non-recoverable;
    /// the dataset is discarded and provenance records the rejection.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// Confidence below the validator's accept threshold (spec §4.7).
    #[error("validation rejected payload (confidence {confidence}): {reason}")]
    ValidationReject { confidence: u8, reason: String },

    /// `resolveConflict` called with zero claims. Programmer error; fatal
    /// within the run that triggered it.
    #[error("conflict resolution invoked with no candidate claims")]
    ConflictEmpty,

    /// Artifact insert or head upsert failed. Fatal to the affected
    /// boundary; recorded and surfaced, and aborts the run if it is a
    /// storage-layer failure rather than a single boundary's.
    #[error("storage failure: {0}")]
    StorageFailure(String),

    /// HEAD/GET aborted by timeout. A cancelled HEAD is "no change"; a
    /// cancelled GET is a recoverable error for that source's attempt.
    #[error("request cancelled by timeout after {elapsed_ms}ms")]
    CancelledByTimeout { elapsed_ms: u64 },
}

impl AcquisitionError {
    /// Whether a retry / later run could plausibly succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AcquisitionError::NetworkTransient(_) => true,
            AcquisitionError::NetworkPermanent(_) => false,
            AcquisitionError::SchemaViolation(_) => false,
            AcquisitionError::ValidationReject { .. } => false,
            AcquisitionError::ConflictEmpty => false,
            AcquisitionError::StorageFailure(_) => false,
            AcquisitionError::CancelledByTimeout { .. } => true,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AcquisitionError::NetworkTransient(_) => ErrorKind::NetworkTransient,
            AcquisitionError::NetworkPermanent(_) => ErrorKind::NetworkPermanent,
            AcquisitionError::SchemaViolation(_) => ErrorKind::SchemaViolation,
            AcquisitionError::ValidationReject { .. } => ErrorKind::ValidationReject,
            AcquisitionError::ConflictEmpty => ErrorKind::ConflictEmpty,
            AcquisitionError::StorageFailure(_) => ErrorKind::StorageFailure,
            AcquisitionError::CancelledByTimeout { .. } => ErrorKind::CancelledByTimeout,
        }
    }
}

/// Bare discriminant, useful for metrics labels and provenance entries
/// where the message text would be noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NetworkTransient,
    NetworkPermanent,
    SchemaViolation,
    ValidationReject,
    ConflictEmpty,
    StorageFailure,
    CancelledByTimeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NetworkTransient => "network_transient",
            ErrorKind::NetworkPermanent => "network_permanent",
            ErrorKind::SchemaViolation => "schema_violation",
            ErrorKind::ValidationReject => "validation_reject",
            ErrorKind::ConflictEmpty => "conflict_empty",
            ErrorKind::StorageFailure => "storage_failure",
            ErrorKind::CancelledByTimeout => "cancelled_by_timeout",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverability_matches_spec_taxonomy() {
        assert!(AcquisitionError::NetworkTransient("timeout".into()).is_recoverable());
        assert!(AcquisitionError::CancelledByTimeout { elapsed_ms: 5000 }.is_recoverable());
        assert!(!AcquisitionError::NetworkPermanent("dns".into()).is_recoverable());
        assert!(!AcquisitionError::SchemaViolation("bad".into()).is_recoverable());
        assert!(!AcquisitionError::ConflictEmpty.is_recoverable());
        assert!(!AcquisitionError::StorageFailure("insert failed".into()).is_recoverable());
        assert!(!AcquisitionError::ValidationReject { confidence: 10, reason: "x".into() }.is_recoverable());
    }
}
