//! Snapshot comparison.
//!
//! Both snapshots are already sorted by path, so the comparison is a single
//! merge-join over the two entry lists:
//! 1. Path only in target: added
//! 2. Path only in source: removed
//! 3. Path in both with differing state: modified
//!
//! Each path lands in exactly one class, so no deduplication pass is needed
//! and every class comes out sorted.

use derive_builder::Builder;
use itertools::{EitherOrBoth, Itertools};
use serde::{Deserialize, Serialize};
use tracing::debug;

use dirsum_core::{Fingerprint, Snapshot};

/// How skipped fingerprints take part in equality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipPolicy {
    /// A path skipped on either side is always reported as modified; its
    /// real state is unknown, so it cannot be confirmed unchanged.
    #[default]
    AlwaysChanged,
    /// Compare recorded fields only and ignore the skip flag. Two skipped
    /// entries with equal (empty) hashes compare equal.
    CompareFields,
}

/// Configuration for snapshot comparison.
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct DiffConfig {
    #[builder(default)]
    #[serde(default)]
    pub skip_policy: SkipPolicy,
}

impl DiffConfig {
    /// Create a new config builder.
    pub fn builder() -> DiffConfigBuilder {
        DiffConfigBuilder::default()
    }
}

/// Classified differences between a source and a target snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffReport {
    /// Paths present only in the target.
    pub added: Vec<String>,
    /// Paths present only in the source.
    pub removed: Vec<String>,
    /// Paths present in both whose fingerprints differ.
    pub modified: Vec<String>,
}

impl DiffReport {
    /// Check if the snapshots were equivalent.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Total number of changed paths.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    /// All changed paths in lexical order, without classification.
    pub fn paths(&self) -> Vec<String> {
        itertools::kmerge([&self.added, &self.removed, &self.modified])
            .cloned()
            .collect()
    }

    /// Consume the report, returning all changed paths in lexical order.
    pub fn into_paths(self) -> Vec<String> {
        itertools::kmerge([self.added, self.removed, self.modified]).collect()
    }
}

/// Computes the set of paths that differ between two snapshots.
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    config: DiffConfig,
}

impl Comparator {
    /// Create a comparator with the default skip policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a comparator with custom config.
    pub fn with_config(config: DiffConfig) -> Self {
        Self { config }
    }

    /// Classify every path whose state differs between `src` and `target`.
    pub fn compare(&self, src: &Snapshot, target: &Snapshot) -> DiffReport {
        let mut report = DiffReport::default();

        let joined = src
            .iter()
            .merge_join_by(target.iter(), |a, b| a.path.cmp(&b.path));

        for pair in joined {
            match pair {
                EitherOrBoth::Left(only_src) => report.removed.push(only_src.path.to_string()),
                EitherOrBoth::Right(only_target) => {
                    report.added.push(only_target.path.to_string())
                }
                EitherOrBoth::Both(a, b) => {
                    if !self.equivalent(a, b) {
                        report.modified.push(a.path.to_string());
                    }
                }
            }
        }

        debug!(
            added = report.added.len(),
            removed = report.removed.len(),
            modified = report.modified.len(),
            "snapshots compared"
        );

        report
    }

    /// Sorted, duplicate-free list of every path that differs.
    pub fn diff(&self, src: &Snapshot, target: &Snapshot) -> Vec<String> {
        self.compare(src, target).into_paths()
    }

    fn equivalent(&self, a: &Fingerprint, b: &Fingerprint) -> bool {
        if self.config.skip_policy == SkipPolicy::AlwaysChanged && (a.skipped || b.skipped) {
            return false;
        }
        a.same_state(b)
    }
}

/// Diff two snapshots with the default comparator.
pub fn diff_snapshots(src: &Snapshot, target: &Snapshot) -> Vec<String> {
    Comparator::new().diff(src, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirsum_core::HashAlgorithm;

    fn file(path: &str, hash: &str) -> Fingerprint {
        let mut fp = Fingerprint::pending("/r", path, HashAlgorithm::Adler32);
        fp.hash = hash.to_string();
        fp.size = hash.len() as u64;
        fp.exists = true;
        fp
    }

    fn skipped(path: &str) -> Fingerprint {
        let mut fp = Fingerprint::pending("/r", path, HashAlgorithm::None);
        fp.exists = true;
        fp.skipped = true;
        fp
    }

    #[test]
    fn test_classification() {
        let src = Snapshot::from_unsorted(vec![file("keep", "1"), file("gone", "2"), file("edit", "3")]);
        let target =
            Snapshot::from_unsorted(vec![file("keep", "1"), file("edit", "4"), file("new", "5")]);

        let report = Comparator::new().compare(&src, &target);
        assert_eq!(report.added, vec!["new"]);
        assert_eq!(report.removed, vec!["gone"]);
        assert_eq!(report.modified, vec!["edit"]);
        assert_eq!(report.paths(), vec!["edit", "gone", "new"]);
        assert_eq!(report.len(), 3);
    }

    #[test]
    fn test_hash_type_not_compared() {
        let a = file("x", "abcd");
        let mut b = a.clone();
        b.hash_type = HashAlgorithm::Blake3;

        let diff = diff_snapshots(&Snapshot::from_unsorted(vec![a]), &Snapshot::from_unsorted(vec![b]));
        assert!(diff.is_empty());
    }

    #[test]
    fn test_skip_policy_always_changed() {
        let src = Snapshot::from_unsorted(vec![skipped("x")]);
        let target = Snapshot::from_unsorted(vec![skipped("x")]);

        assert_eq!(Comparator::new().diff(&src, &target), vec!["x"]);
    }

    #[test]
    fn test_skip_policy_compare_fields() {
        let src = Snapshot::from_unsorted(vec![skipped("x")]);
        let target = Snapshot::from_unsorted(vec![skipped("x")]);

        let config = DiffConfig::builder()
            .skip_policy(SkipPolicy::CompareFields)
            .build()
            .unwrap();
        assert!(Comparator::with_config(config).diff(&src, &target).is_empty());
    }

    #[test]
    fn test_skipped_vs_hashed_differs_under_both_policies() {
        let src = Snapshot::from_unsorted(vec![skipped("x")]);
        let target = Snapshot::from_unsorted(vec![file("x", "ff")]);

        let lenient = Comparator::with_config(DiffConfig {
            skip_policy: SkipPolicy::CompareFields,
        });
        assert_eq!(lenient.diff(&src, &target), vec!["x"]);
        assert_eq!(Comparator::new().diff(&src, &target), vec!["x"]);
    }

    #[test]
    fn test_empty_snapshots() {
        let report = Comparator::new().compare(&Snapshot::new(), &Snapshot::new());
        assert!(report.is_empty());
        assert!(report.into_paths().is_empty());
    }
}
