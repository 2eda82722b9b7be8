//! Snapshot comparison for dirsum.
//!
//! Given a baseline (source) and a candidate (target) snapshot, the
//! comparator reports every relative path whose state differs:
//!
//! - **Added** - present only in the target
//! - **Removed** - present only in the source
//! - **Modified** - present in both with a different hash, size, type or
//!   existence flag
//!
//! The flat result is the sorted union of the three classes.
//!
//! ```rust,ignore
//! use dirsum_diff::Comparator;
//! use dirsum_scan::{Walker, WalkConfig};
//!
//! let walker = Walker::new();
//! let before = walker.walk(&WalkConfig::new("/srv/data")).unwrap();
//! // ... tree changes ...
//! let after = walker.walk(&WalkConfig::new("/srv/data")).unwrap();
//!
//! for path in Comparator::new().diff(&before, &after) {
//!     println!("{path}");
//! }
//! ```

mod comparator;

pub use comparator::{
    Comparator, DiffConfig, DiffConfigBuilder, DiffReport, SkipPolicy, diff_snapshots,
};

// Re-export core types
pub use dirsum_core::{Fingerprint, Snapshot};
