//! Shared domain types for the Shadow Atlas acquisition pipeline.
//!
//! Every crate in the workspace depends on this one for the entities
//! described in the data model: boundary/source taxonomy, the
//! content-addressed artifact/head pair, conflict-resolution records, and
//! the append-only provenance envelope. Nothing here talks to a network or
//! a database — it is pure data plus the invariants that protect it.

pub mod artifact;
pub mod boundary;
pub mod claim;
pub mod error;
pub mod event;
pub mod provenance;
pub mod source;

pub use artifact::{Artifact, ArtifactError, BoundingBox, Head};
pub use boundary::{AuthorityLevel, BoundaryType, Jurisdiction, SourceKind};
pub use claim::{ResolutionDecision, ResolutionReject, SourceClaim};
pub use error::AcquisitionError;
pub use event::{ChangeReport, ChangeTrigger, ChangeType};
pub use provenance::{CompactDiscoveryEntry, ProvenanceRecord, QualitySummary};
pub use source::{CanonicalSource, SourceDescriptor, SourceUrl, UpdateTrigger};
