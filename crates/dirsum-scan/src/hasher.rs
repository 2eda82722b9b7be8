//! Streaming content hashers.
//!
//! Each algorithm reads the whole file through a 64 KiB buffer and yields
//! a lowercase hex digest. I/O failures are returned to the caller, which
//! decides whether the entry is recorded as skipped or vanished.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use dirsum_core::HashAlgorithm;
use thiserror::Error;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Failure while hashing a single file.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Whether the file disappeared before it could be hashed.
    pub fn is_not_found(&self) -> bool {
        let source = match self {
            HashError::Open { source, .. } | HashError::Read { source, .. } => source,
        };
        source.kind() == io::ErrorKind::NotFound
    }
}

/// Incremental digest state for one of the hashing algorithms.
enum Digest {
    Adler32(adler2::Adler32),
    Blake3(Box<blake3::Hasher>),
    Md5(md5::Md5),
}

impl Digest {
    fn new(algorithm: HashAlgorithm) -> Option<Self> {
        match algorithm {
            HashAlgorithm::None => None,
            HashAlgorithm::Adler32 => Some(Digest::Adler32(adler2::Adler32::new())),
            HashAlgorithm::Blake3 => Some(Digest::Blake3(Box::new(blake3::Hasher::new()))),
            HashAlgorithm::Md5 => Some(Digest::Md5(<md5::Md5 as md5::Digest>::new())),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Digest::Adler32(adler) => adler.write_slice(bytes),
            Digest::Blake3(hasher) => {
                hasher.update(bytes);
            }
            Digest::Md5(hasher) => md5::Digest::update(hasher, bytes),
        }
    }

    fn finish_hex(self) -> String {
        match self {
            // Big-endian, matching the checksum's usual byte representation.
            Digest::Adler32(adler) => format!("{:08x}", adler.checksum()),
            Digest::Blake3(hasher) => hasher.finalize().to_hex().to_string(),
            Digest::Md5(hasher) => md5::Digest::finalize(hasher)
                .iter()
                .map(|byte| format!("{byte:02x}"))
                .collect(),
        }
    }
}

/// Hash everything `reader` yields. Returns an empty string for
/// [`HashAlgorithm::None`] without reading.
pub fn hash_reader<R: Read>(mut reader: R, algorithm: HashAlgorithm) -> io::Result<String> {
    let Some(mut digest) = Digest::new(algorithm) else {
        return Ok(String::new());
    };

    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        digest.update(&buffer[..bytes_read]);
    }

    Ok(digest.finish_hex())
}

/// Hash the full content of the file at `path`.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<String, HashError> {
    if algorithm.is_none() {
        return Ok(String::new());
    }

    let file = File::open(path).map_err(|source| HashError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    hash_reader(file, algorithm).map_err(|source| HashError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_adler32_known_values() {
        assert_eq!(hash_reader(&b""[..], HashAlgorithm::Adler32).unwrap(), "00000001");
        assert_eq!(hash_reader(&b"hi"[..], HashAlgorithm::Adler32).unwrap(), "013b00d2");
    }

    #[test]
    fn test_blake3_known_value() {
        assert_eq!(
            hash_reader(&b""[..], HashAlgorithm::Blake3).unwrap(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn test_md5_known_values() {
        assert_eq!(
            hash_reader(&b""[..], HashAlgorithm::Md5).unwrap(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            hash_reader(&b"abc"[..], HashAlgorithm::Md5).unwrap(),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }

    #[test]
    fn test_none_is_empty() {
        assert_eq!(hash_reader(&b"data"[..], HashAlgorithm::None).unwrap(), "");
    }

    #[test]
    fn test_hash_spans_buffer_boundary() {
        let data = vec![7u8; READ_BUFFER_SIZE * 2 + 17];
        let streamed = hash_reader(data.as_slice(), HashAlgorithm::Blake3).unwrap();
        assert_eq!(streamed, blake3::hash(&data).to_hex().to_string());
    }

    #[test]
    fn test_hash_file_matches_reader() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file.txt");
        fs::write(&path, "hello world").unwrap();

        let from_file = hash_file(&path, HashAlgorithm::Adler32).unwrap();
        let from_reader = hash_reader(&b"hello world"[..], HashAlgorithm::Adler32).unwrap();
        assert_eq!(from_file, from_reader);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = hash_file(&temp.path().join("gone"), HashAlgorithm::Adler32).unwrap_err();
        assert!(err.is_not_found());
    }
}
