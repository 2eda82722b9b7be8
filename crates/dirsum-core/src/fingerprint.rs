//! Per-entry fingerprint types.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Content hash algorithm applied to a regular file.
///
/// The serialized tags match the snapshot format written by earlier
/// releases of the tool, so `""` means no hash was computed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum HashAlgorithm {
    /// No content hash (directories, symlinks, big files).
    #[default]
    #[serde(rename = "")]
    #[strum(serialize = "none")]
    None,
    /// Adler-32 weak checksum. Cheap, but collision-prone at scale.
    #[serde(rename = "adler32")]
    #[strum(serialize = "adler32")]
    Adler32,
    /// BLAKE3 strong hash.
    #[serde(rename = "blake3")]
    #[strum(serialize = "blake3")]
    Blake3,
    /// MD5, the strong hash of older snapshot files.
    #[serde(rename = "md5")]
    #[strum(serialize = "md5")]
    Md5,
}

impl HashAlgorithm {
    /// Whether this algorithm produces a digest at all.
    pub fn is_none(self) -> bool {
        matches!(self, HashAlgorithm::None)
    }
}

/// Recorded state of one filesystem entry at walk time.
///
/// Field names on the wire are the PascalCase keys existing snapshot
/// files use, so snapshots written by older agents still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Root directory the walk started from.
    #[serde(rename = "DirName", default)]
    pub root: String,

    /// Path relative to the root, always `/`-separated.
    #[serde(rename = "FileName")]
    pub path: CompactString,

    /// Hex-encoded digest, empty when no hash was computed.
    #[serde(rename = "Hash", default)]
    pub hash: String,

    /// Algorithm that produced `hash`.
    #[serde(rename = "HashType", default)]
    pub hash_type: HashAlgorithm,

    /// Size in bytes (regular files only, otherwise 0).
    #[serde(rename = "FileSize", default)]
    pub size: u64,

    /// Whether the entry still existed when it was stat'ed.
    #[serde(rename = "IsExist", default)]
    pub exists: bool,

    #[serde(rename = "IsDir", default)]
    pub is_dir: bool,

    #[serde(rename = "IsLink", default)]
    pub is_symlink: bool,

    /// Set when stat or hashing failed; the rest of the record is partial.
    #[serde(rename = "IsSkip", default)]
    pub skipped: bool,
}

impl Fingerprint {
    /// Create an unresolved fingerprint for `path` under `root`.
    ///
    /// Existence, type, size and hash are filled in by the load step.
    pub fn pending(
        root: impl Into<String>,
        path: impl Into<CompactString>,
        hash_type: HashAlgorithm,
    ) -> Self {
        Self {
            root: root.into(),
            path: path.into(),
            hash: String::new(),
            hash_type,
            size: 0,
            exists: false,
            is_dir: false,
            is_symlink: false,
            skipped: false,
        }
    }

    /// Compare the observable state of two fingerprints.
    ///
    /// Hash, size, type flags and existence must all match. The hash
    /// algorithm tag and the skip flag are not part of this comparison.
    pub fn same_state(&self, other: &Fingerprint) -> bool {
        self.hash == other.hash
            && self.size == other.size
            && self.is_dir == other.is_dir
            && self.is_symlink == other.is_symlink
            && self.exists == other.exists
    }

    /// Check if this is a regular file that exists.
    pub fn is_file(&self) -> bool {
        self.exists && !self.is_dir && !self.is_symlink
    }
}
