//! Walk configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::fingerprint::HashAlgorithm;

/// Default big-file threshold: files larger than 10 MiB are not hashed.
pub const DEFAULT_BIG_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Configuration for a fingerprinting walk.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct WalkConfig {
    /// Root directory to walk.
    pub root: PathBuf,

    /// Files strictly larger than this many bytes are recorded without a hash.
    #[builder(default = "DEFAULT_BIG_FILE_THRESHOLD")]
    #[serde(default = "default_big_file_threshold")]
    pub big_file_threshold: u64,

    /// Algorithm used for files at or below the threshold.
    #[builder(default = "HashAlgorithm::Adler32")]
    #[serde(default = "default_algorithm")]
    pub algorithm: HashAlgorithm,

    /// Number of threads for traversal and hashing (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,
}

fn default_big_file_threshold() -> u64 {
    DEFAULT_BIG_FILE_THRESHOLD
}

fn default_algorithm() -> HashAlgorithm {
    HashAlgorithm::Adler32
}

impl WalkConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl WalkConfig {
    /// Create a new walk config builder.
    pub fn builder() -> WalkConfigBuilder {
        WalkConfigBuilder::default()
    }

    /// Create a default config for walking a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            big_file_threshold: DEFAULT_BIG_FILE_THRESHOLD,
            algorithm: HashAlgorithm::Adler32,
            threads: 0,
        }
    }

    /// Pick the hash algorithm for a file of `size` bytes.
    ///
    /// A file exactly at the threshold is still hashed.
    pub fn algorithm_for(&self, size: u64) -> HashAlgorithm {
        if size > self.big_file_threshold {
            HashAlgorithm::None
        } else {
            self.algorithm
        }
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = WalkConfig::builder()
            .root("/srv/data")
            .big_file_threshold(1024u64)
            .algorithm(HashAlgorithm::Blake3)
            .threads(4usize)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/srv/data"));
        assert_eq!(config.big_file_threshold, 1024);
        assert_eq!(config.algorithm, HashAlgorithm::Blake3);
        assert_eq!(config.threads, 4);
    }

    #[test]
    fn test_builder_requires_root() {
        assert!(WalkConfig::builder().build().is_err());
        assert!(WalkConfig::builder().root("").build().is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = WalkConfig::new("/srv/data");
        assert_eq!(config.big_file_threshold, DEFAULT_BIG_FILE_THRESHOLD);
        assert_eq!(config.algorithm, HashAlgorithm::Adler32);
        assert_eq!(config.threads, 0);
    }

    #[test]
    fn test_algorithm_for_threshold_boundary() {
        let config = WalkConfig::builder()
            .root("/srv/data")
            .big_file_threshold(100u64)
            .build()
            .unwrap();

        assert_eq!(config.algorithm_for(99), HashAlgorithm::Adler32);
        assert_eq!(config.algorithm_for(100), HashAlgorithm::Adler32);
        assert_eq!(config.algorithm_for(101), HashAlgorithm::None);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: WalkConfig = serde_json::from_str(r#"{"root":"/tmp"}"#).unwrap();
        assert_eq!(config.big_file_threshold, DEFAULT_BIG_FILE_THRESHOLD);
        assert_eq!(config.algorithm, HashAlgorithm::Adler32);
    }
}
