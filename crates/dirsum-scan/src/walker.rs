//! JWalk-based parallel directory walker.

use std::collections::HashSet;
use std::path::{Component, Path};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use dirsum_core::{Fingerprint, HashAlgorithm, Snapshot, WalkConfig, WalkError};

use crate::builder::FingerprintBuilder;
use crate::progress::{ProgressTracker, WalkPhase, WalkProgress};

/// How often (in entries) a progress update is published.
const PROGRESS_INTERVAL: u64 = 1000;

/// Produces snapshots of directory trees.
pub struct Walker {
    progress_tx: broadcast::Sender<WalkProgress>,
}

impl Walker {
    /// Create a new walker.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to walk progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<WalkProgress> {
        self.progress_tx.subscribe()
    }

    /// Walk `config.root` and return its sorted snapshot.
    ///
    /// Only a root that cannot be stat'ed, is not a directory, or cannot be
    /// listed fails the walk. Every other fault is recorded on the entry.
    pub fn walk(&self, config: &WalkConfig) -> Result<Snapshot, WalkError> {
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| WalkError::io(&config.root, e))?;

        if !root_path.is_dir() {
            return Err(WalkError::NotADirectory { path: root_path });
        }

        // jwalk reports an unreadable root as an ordinary entry error, so
        // check it up front.
        std::fs::read_dir(&root_path).map_err(|e| WalkError::io(&root_path, e))?;

        let mut tracker = ProgressTracker::new();
        let discovered = self.discover(config, &root_path, &mut tracker)?;

        tracker.set_phase(WalkPhase::Fingerprinting);
        let _ = self.progress_tx.send(tracker.snapshot());

        let builder = FingerprintBuilder::new(config).with_resolved_root(root_path.clone());
        let fingerprints = self.fingerprint_all(config, &builder, &discovered, &tracker)?;

        let bytes_hashed = fingerprints
            .iter()
            .filter(|fp| !fp.hash.is_empty())
            .map(|fp| fp.size)
            .sum();
        let skipped = fingerprints.iter().filter(|fp| fp.skipped).count() as u64;
        tracker.finish(fingerprints.len() as u64, bytes_hashed, skipped);

        let snapshot = Snapshot::from_unsorted(fingerprints);
        let progress = tracker.snapshot();
        let _ = self.progress_tx.send(progress.clone());

        info!(
            root = %config.root.display(),
            entries = snapshot.len(),
            skipped,
            bytes_hashed,
            elapsed_ms = progress.elapsed.as_millis() as u64,
            "walk complete"
        );

        Ok(snapshot)
    }

    /// Traverse the tree and collect relative paths of every entry.
    fn discover(
        &self,
        config: &WalkConfig,
        root_path: &Path,
        tracker: &mut ProgressTracker,
    ) -> Result<Discovered, WalkError> {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(root_path)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(false)
            .min_depth(0);

        let mut discovered = Discovered::default();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    if path == root_path {
                        return Err(WalkError::Io {
                            path,
                            source: std::io::Error::other(err.to_string()),
                        });
                    }
                    warn!(path = %path.display(), error = %err, "failed to read entry");
                    tracker.record_fault();
                    if let Some(relative) = relative_slash_path(root_path, &path) {
                        discovered.unreadable.insert(relative);
                    }
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path();
            let Some(relative) = relative_slash_path(root_path, &path) else {
                debug!(path = %path.display(), "entry outside root, ignoring");
                continue;
            };

            if let Some(err) = entry.read_children_error.as_ref() {
                warn!(path = %path.display(), error = %err, "failed to list directory");
                tracker.record_fault();
                discovered.unreadable.insert(relative.clone());
            }

            discovered.paths.push(relative);
            tracker.record_discovered(path);

            if tracker.discovered() % PROGRESS_INTERVAL == 0 {
                let _ = self.progress_tx.send(tracker.snapshot());
            }
        }

        Ok(discovered)
    }

    /// Build fingerprints for all discovered entries in parallel.
    fn fingerprint_all(
        &self,
        config: &WalkConfig,
        builder: &FingerprintBuilder,
        discovered: &Discovered,
        tracker: &ProgressTracker,
    ) -> Result<Vec<Fingerprint>, WalkError> {
        let done = AtomicU64::new(0);

        let build_one = |relative: &String| {
            let mut fp = builder.build(relative);
            if discovered.unreadable.contains(relative) {
                fp.skipped = true;
            }

            let count = done.fetch_add(1, Ordering::Relaxed) + 1;
            if count % PROGRESS_INTERVAL == 0 {
                let mut progress = tracker.snapshot();
                progress.entries_fingerprinted = count;
                let _ = self.progress_tx.send(progress);
            }
            fp
        };

        let mut fingerprints: Vec<Fingerprint> = match config.threads {
            0 => discovered.paths.par_iter().map(build_one).collect(),
            n => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| WalkError::InvalidConfig {
                    message: format!("failed to start hashing pool: {e}"),
                })?
                .install(|| discovered.paths.par_iter().map(build_one).collect()),
        };

        // Entries that failed before the traversal could yield them still
        // get a record so the failure is visible in the snapshot.
        let listed: HashSet<&str> = discovered.paths.iter().map(String::as_str).collect();
        for relative in &discovered.unreadable {
            if !listed.contains(relative.as_str()) {
                let mut fp = Fingerprint::pending(
                    config.root.to_string_lossy().into_owned(),
                    relative.as_str(),
                    HashAlgorithm::None,
                );
                fp.skipped = true;
                fingerprints.push(fp);
            }
        }

        Ok(fingerprints)
    }
}

impl Default for Walker {
    fn default() -> Self {
        Self::new()
    }
}

/// Entries collected by the traversal phase.
#[derive(Default)]
struct Discovered {
    paths: Vec<String>,
    unreadable: HashSet<String>,
}

/// Relative path of `path` under `root`, joined with `/` on every platform.
///
/// Returns `None` for the root itself and for paths outside it.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/.hidden"), "hidden").unwrap();

        temp
    }

    #[test]
    fn test_basic_walk() {
        let temp = create_test_tree();
        let snapshot = Walker::new().walk(&WalkConfig::new(temp.path())).unwrap();

        let paths: Vec<_> = snapshot.paths().collect();
        assert_eq!(
            paths,
            vec![
                "dir1",
                "dir1/file2.txt",
                "dir1/subdir",
                "dir1/subdir/file3.txt",
                "dir2",
                "dir2/.hidden",
                "file1.txt",
            ]
        );
        assert!(snapshot.iter().all(|fp| fp.exists && !fp.skipped));
    }

    #[test]
    fn test_root_label_kept_as_configured() {
        let temp = create_test_tree();
        let config = WalkConfig::new(temp.path());
        let snapshot = Walker::new().walk(&config).unwrap();
        let label = config.root.to_string_lossy();
        assert!(snapshot.iter().all(|fp| fp.root == label));
    }

    #[test]
    fn test_explicit_thread_count() {
        let temp = create_test_tree();
        let config = WalkConfig::builder()
            .root(temp.path())
            .threads(2usize)
            .build()
            .unwrap();
        let snapshot = Walker::new().walk(&config).unwrap();
        assert_eq!(snapshot.len(), 7);
    }

    #[test]
    fn test_progress_reaches_done() {
        let temp = create_test_tree();
        let walker = Walker::new();
        let mut rx = walker.subscribe();
        walker.walk(&WalkConfig::new(temp.path())).unwrap();

        let mut last = None;
        while let Ok(progress) = rx.try_recv() {
            last = Some(progress);
        }
        let last = last.unwrap();
        assert_eq!(last.phase, WalkPhase::Done);
        assert_eq!(last.entries_discovered, 7);
        assert_eq!(last.entries_fingerprinted, 7);
    }

    #[test]
    fn test_relative_slash_path() {
        let root = Path::new("/data");
        assert_eq!(
            relative_slash_path(root, &root.join("a").join("b.txt")),
            Some("a/b.txt".to_string())
        );
        assert_eq!(relative_slash_path(root, root), None);
        assert_eq!(relative_slash_path(root, Path::new("/other/x")), None);
    }
}
