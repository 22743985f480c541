//! Shard path resolution and gzipped-NDJSON frame I/O.
//!
//! Shards are keyed by the entry's `state` field (already a two-letter
//! postal abbreviation on every `CompactDiscoveryEntry`), giving the
//! documented 50-state shard layout without a separate FIPS lookup table.

use flate2::write::GzEncoder;
use flate2::Compression;
use shadow_atlas_contracts::CompactDiscoveryEntry;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::ProvenanceError;

pub(crate) fn shard_key(entry: &CompactDiscoveryEntry) -> String {
    entry.state.to_ascii_uppercase()
}

pub(crate) fn standard_shard_path(root: &Path, state: &str) -> PathBuf {
    root.join("shards").join(format!("{state}.ndjson.gz"))
}

pub(crate) fn staging_path(root: &Path, agent_id: &str) -> PathBuf {
    root.join("staging").join(format!("{agent_id}.ndjson"))
}

/// Appends one entry to a gzip shard as its own gzip member. Concatenated
/// gzip members form a single valid stream, so each append is an
/// independent compressed frame and never requires rewriting prior data.
pub(crate) fn append_gz_frame(path: &Path, entry: &CompactDiscoveryEntry) -> Result<(), ProvenanceError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let line = serde_json::to_string(entry)?;
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(line.as_bytes())?;
    encoder.write_all(b"\n")?;
    encoder.finish()?;
    Ok(())
}

/// Appends one entry to a plain NDJSON staging file (no compression; the
/// merger compresses into the canonical shard).
pub(crate) fn append_plain_line(path: &Path, entry: &CompactDiscoveryEntry) -> Result<(), ProvenanceError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let line = serde_json::to_string(entry)?;
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Reads every entry out of a gzip shard, skipping entries that fail to
/// parse rather than aborting the whole read (a shard is a sequence of
/// independent frames).
pub(crate) fn read_gz_shard(path: &Path) -> Result<Vec<CompactDiscoveryEntry>, ProvenanceError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)?;
    let decoder = flate2::read::MultiGzDecoder::new(file);
    let reader = BufReader::new(decoder);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CompactDiscoveryEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(err) => tracing::warn!(error = %err, "skipping malformed provenance frame"),
        }
    }
    Ok(entries)
}

pub(crate) fn read_plain_file(path: &Path) -> Result<Vec<CompactDiscoveryEntry>, ProvenanceError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str::<CompactDiscoveryEntry>(&line)?);
    }
    Ok(entries)
}
