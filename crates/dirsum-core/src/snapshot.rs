//! Sorted snapshot container.

use serde::{Deserialize, Serialize, Serializer};

use crate::fingerprint::Fingerprint;

/// Fingerprints of one tree at one instant, sorted by relative path.
///
/// The ordering is byte order on the `/`-separated relative path and holds
/// for every constructor, so two snapshots of an identical tree serialize
/// to identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<Fingerprint>")]
pub struct Snapshot {
    entries: Vec<Fingerprint>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from fingerprints in any order.
    ///
    /// Entries are sorted by path. If a path repeats, the first occurrence
    /// wins.
    pub fn from_unsorted(mut entries: Vec<Fingerprint>) -> Self {
        // Stable sort keeps the first of equal paths in front for dedup_by.
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries.dedup_by(|later, earlier| later.path == earlier.path);
        Self { entries }
    }

    /// All fingerprints in path order.
    pub fn entries(&self) -> &[Fingerprint] {
        &self.entries
    }

    /// Iterate fingerprints in path order.
    pub fn iter(&self) -> std::slice::Iter<'_, Fingerprint> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the snapshot holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the fingerprint recorded for a relative path.
    pub fn get(&self, path: &str) -> Option<&Fingerprint> {
        self.entries
            .binary_search_by(|fp| fp.path.as_str().cmp(path))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// Relative paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|fp| fp.path.as_str())
    }

    /// Total size of all regular files.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().filter(|fp| fp.is_file()).map(|fp| fp.size).sum()
    }

    /// Number of entries that could not be fully read.
    pub fn skipped_count(&self) -> usize {
        self.entries.iter().filter(|fp| fp.skipped).count()
    }

    /// Consume the snapshot, returning the sorted fingerprints.
    pub fn into_entries(self) -> Vec<Fingerprint> {
        self.entries
    }
}

impl From<Vec<Fingerprint>> for Snapshot {
    fn from(entries: Vec<Fingerprint>) -> Self {
        Self::from_unsorted(entries)
    }
}

impl FromIterator<Fingerprint> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Fingerprint>>(iter: I) -> Self {
        Self::from_unsorted(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Fingerprint;
    type IntoIter = std::slice::Iter<'a, Fingerprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// Serialized as a bare array, not as `{"entries": [...]}`.
impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::HashAlgorithm;

    fn fp(path: &str) -> Fingerprint {
        Fingerprint::pending("/r", path, HashAlgorithm::None)
    }

    #[test]
    fn test_from_unsorted_sorts_by_byte_order() {
        let snap = Snapshot::from_unsorted(vec![fp("b"), fp("B"), fp("a/z"), fp("a")]);
        let paths: Vec<_> = snap.paths().collect();
        assert_eq!(paths, vec!["B", "a", "a/z", "b"]);
    }

    #[test]
    fn test_duplicate_paths_keep_first() {
        let mut first = fp("x");
        first.size = 1;
        let mut second = fp("x");
        second.size = 2;

        let snap = Snapshot::from_unsorted(vec![first, fp("a"), second]);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.get("x").unwrap().size, 1);
    }

    #[test]
    fn test_get() {
        let snap: Snapshot = vec![fp("c"), fp("a"), fp("b")].into_iter().collect();
        assert!(snap.get("b").is_some());
        assert!(snap.get("d").is_none());
    }

    #[test]
    fn test_serializes_as_array() {
        let snap = Snapshot::from_unsorted(vec![fp("a")]);
        let json = serde_json::to_value(&snap).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["FileName"], "a");
    }

    #[test]
    fn test_deserialize_restores_order() {
        let snap: Snapshot =
            serde_json::from_str(r#"[{"FileName":"z"},{"FileName":"m"}]"#).unwrap();
        let paths: Vec<_> = snap.paths().collect();
        assert_eq!(paths, vec!["m", "z"]);
    }
}
