//! Directory walking and fingerprinting for dirsum.
//!
//! This crate turns a directory tree into a [`Snapshot`]: one
//! [`Fingerprint`] per entry, sorted by relative path.
//!
//! - **Parallel traversal** via jwalk/rayon
//! - **Parallel hashing**, with a size threshold above which files are
//!   recorded without a hash
//! - **Fault tolerance**: vanished and unreadable entries are recorded,
//!   not fatal
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use dirsum_scan::{Walker, WalkConfig};
//!
//! let config = WalkConfig::new("/path/to/tree");
//! let snapshot = Walker::new().walk(&config).unwrap();
//!
//! println!("{} entries, {} bytes", snapshot.len(), snapshot.total_size());
//! ```

mod builder;
mod hasher;
mod progress;
mod walker;

pub use builder::FingerprintBuilder;
pub use hasher::{HashError, hash_file, hash_reader};
pub use progress::{WalkPhase, WalkProgress};
pub use walker::{Walker, relative_slash_path};

// Re-export core types for convenience
pub use dirsum_core::{Fingerprint, HashAlgorithm, Snapshot, WalkConfig, WalkError};
