//! Core types for dirsum.
//!
//! This crate provides the data model shared by the walker, the comparator
//! and the HTTP service: per-entry fingerprints, sorted snapshots, walk
//! configuration and the JSON snapshot store.

mod config;
mod error;
mod fingerprint;
mod snapshot;
mod store;

pub use config::{DEFAULT_BIG_FILE_THRESHOLD, WalkConfig, WalkConfigBuilder};
pub use error::{StoreError, WalkError};
pub use fingerprint::{Fingerprint, HashAlgorithm};
pub use snapshot::Snapshot;
pub use store::SnapshotStore;
