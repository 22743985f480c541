//! Result type for `mergeStagingFiles`.

#[derive(Debug, Default, Clone)]
pub struct MergeReport {
    pub merged: u64,
    pub errors: Vec<String>,
}
