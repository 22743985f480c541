#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid artifact: {0}")]
    InvalidArtifact(#[from] shadow_atlas_contracts::ArtifactError),
}
