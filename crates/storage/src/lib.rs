//! Postgres-backed artifact/head store and event log (spec §6). Artifacts
//! are content-addressed and immutable; heads are the only mutable pointer,
//! and every commit touching a municipality is serialized through a
//! per-muniId lock (spec §5).

mod error;
mod pool;
mod schema;
mod store;

pub use error::StorageError;
pub use pool::create_pool;
pub use schema::ensure_schema;
pub use store::{EventKind, NewArtifact, NewEvent, Store};
