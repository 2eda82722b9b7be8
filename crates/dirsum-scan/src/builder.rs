//! Single-entry fingerprint resolution.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dirsum_core::{Fingerprint, HashAlgorithm, WalkConfig};
use tracing::{debug, warn};

use crate::hasher::hash_file;

/// Resolves stat and hash data for entries under one root.
///
/// Every call is independent of every other, so a builder can be shared
/// across threads and driven in parallel.
#[derive(Debug, Clone)]
pub struct FingerprintBuilder {
    root: PathBuf,
    root_label: String,
    config: WalkConfig,
}

impl FingerprintBuilder {
    /// Create a builder for the root and hashing policy in `config`.
    pub fn new(config: &WalkConfig) -> Self {
        Self {
            root: config.root.clone(),
            root_label: config.root.to_string_lossy().into_owned(),
            config: config.clone(),
        }
    }

    /// Use `root` for filesystem access while recording the configured
    /// root in each fingerprint.
    pub(crate) fn with_resolved_root(mut self, root: PathBuf) -> Self {
        self.root = root;
        self
    }

    /// Absolute path of a `/`-separated relative path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }

    /// Stat and, for regular files within the threshold, hash one entry.
    ///
    /// Never fails: a vanished entry yields `exists == false`, any other
    /// stat or read failure yields `skipped == true`.
    pub fn build(&self, relative: &str) -> Fingerprint {
        let mut fp = Fingerprint::pending(self.root_label.as_str(), relative, HashAlgorithm::None);
        let path = self.resolve(relative);

        // symlink_metadata: links are recorded, never followed.
        let metadata = match fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "entry vanished before stat");
                return fp;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "stat failed, marking entry skipped");
                fp.skipped = true;
                return fp;
            }
        };

        fp.exists = true;
        let file_type = metadata.file_type();

        if file_type.is_symlink() {
            fp.is_symlink = true;
            return fp;
        }
        if file_type.is_dir() {
            fp.is_dir = true;
            return fp;
        }

        fp.size = metadata.len();

        // Sockets, fifos and devices are recorded by size only; reading a
        // fifo would block the walk.
        if !file_type.is_file() {
            return fp;
        }

        let algorithm = self.config.algorithm_for(fp.size);
        if algorithm.is_none() {
            return fp;
        }

        fp.hash_type = algorithm;
        self.fill_hash(&mut fp, &path, algorithm);
        fp
    }

    fn fill_hash(&self, fp: &mut Fingerprint, path: &Path, algorithm: HashAlgorithm) {
        match hash_file(path, algorithm) {
            Ok(hash) => fp.hash = hash,
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "entry vanished before hashing");
                fp.exists = false;
                fp.size = 0;
                fp.hash_type = HashAlgorithm::None;
            }
            Err(e) => {
                warn!(error = %e, "hashing failed, marking entry skipped");
                fp.skipped = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn builder(root: &Path, threshold: u64) -> FingerprintBuilder {
        let config = WalkConfig::builder()
            .root(root)
            .big_file_threshold(threshold)
            .build()
            .unwrap();
        FingerprintBuilder::new(&config)
    }

    #[test]
    fn test_regular_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "hi").unwrap();

        let fp = builder(temp.path(), 1024).build("a.txt");
        assert!(fp.exists);
        assert!(!fp.is_dir);
        assert!(!fp.skipped);
        assert_eq!(fp.size, 2);
        assert_eq!(fp.hash_type, HashAlgorithm::Adler32);
        assert_eq!(fp.hash, "013b00d2");
        assert_eq!(fp.root, temp.path().to_string_lossy());
    }

    #[test]
    fn test_directory_has_no_hash_or_size() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("sub/inner")).unwrap();

        let fp = builder(temp.path(), 1024).build("sub/inner");
        assert!(fp.exists);
        assert!(fp.is_dir);
        assert_eq!(fp.size, 0);
        assert!(fp.hash.is_empty());
        assert_eq!(fp.hash_type, HashAlgorithm::None);
    }

    #[test]
    fn test_vanished_entry() {
        let temp = TempDir::new().unwrap();
        let fp = builder(temp.path(), 1024).build("missing.txt");
        assert!(!fp.exists);
        assert!(!fp.skipped);
        assert_eq!(fp.path, "missing.txt");
    }

    #[test]
    fn test_big_file_not_hashed() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("big.bin"), vec![0u8; 11]).unwrap();

        let fp = builder(temp.path(), 10).build("big.bin");
        assert_eq!(fp.size, 11);
        assert!(fp.hash.is_empty());
        assert_eq!(fp.hash_type, HashAlgorithm::None);
        assert!(!fp.skipped);
    }

    #[test]
    fn test_resolve_splits_on_slash() {
        let b = builder(Path::new("/data"), 10);
        assert_eq!(b.resolve("a/b/c.txt"), Path::new("/data").join("a").join("b").join("c.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_not_followed() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("target.txt"), "content").unwrap();
        std::os::unix::fs::symlink(temp.path().join("target.txt"), temp.path().join("link"))
            .unwrap();

        let fp = builder(temp.path(), 1024).build("link");
        assert!(fp.exists);
        assert!(fp.is_symlink);
        assert!(fp.hash.is_empty());
        assert_eq!(fp.size, 0);
    }
}
