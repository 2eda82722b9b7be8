//! JSON persistence for snapshots.
//!
//! A snapshot is stored as an indented JSON array of fingerprint records.
//! `save` overwrites the target file in one write; it does not write to a
//! temporary file and rename, so a crash mid-write can leave a truncated
//! file behind. Callers that need atomic replacement must arrange it.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::StoreError;
use crate::snapshot::Snapshot;

/// Reads and writes snapshots in the persisted array format.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotStore;

impl SnapshotStore {
    /// Encode a snapshot as indented JSON.
    pub fn to_json(snapshot: &Snapshot) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(snapshot)?)
    }

    /// Decode a snapshot from JSON text.
    pub fn from_json(json: &str) -> Result<Snapshot, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode a snapshot from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Snapshot, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode a snapshot as indented JSON into any writer.
    pub fn write_to<W: Write>(writer: W, snapshot: &Snapshot) -> Result<(), StoreError> {
        serde_json::to_writer_pretty(writer, snapshot)?;
        Ok(())
    }

    /// Decode a snapshot from any reader.
    pub fn read_from<R: Read>(reader: R) -> Result<Snapshot, StoreError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Overwrite `path` with the encoded snapshot.
    pub fn save(path: impl AsRef<Path>, snapshot: &Snapshot) -> Result<(), StoreError> {
        let path = path.as_ref();
        let json = Self::to_json(snapshot)?;
        fs::write(path, json).map_err(|e| StoreError::io(path, e))
    }

    /// Load a snapshot previously written with [`SnapshotStore::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Snapshot, StoreError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
        Self::from_slice(&bytes)
    }
}
