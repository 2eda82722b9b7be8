//! Service configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use dirsum_core::{DEFAULT_BIG_FILE_THRESHOLD, HashAlgorithm, WalkConfig};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default number of lines retained by the operation log.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Default request body limit (snapshots and base64 uploads).
pub const DEFAULT_MAX_BODY_BYTES: usize = 256 * 1024 * 1024;

/// Configuration for the HTTP service.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ServeConfig {
    /// Directory that diffs walk and mutations apply to.
    pub root: PathBuf,

    /// Address to bind. Loopback unless explicitly widened.
    #[builder(default = "IpAddr::V4(Ipv4Addr::LOCALHOST)")]
    #[serde(default = "default_bind")]
    pub bind: IpAddr,

    #[builder(default = "DEFAULT_PORT")]
    #[serde(default = "default_port")]
    pub port: u16,

    /// Files larger than this are not hashed during diff walks.
    #[builder(default = "DEFAULT_BIG_FILE_THRESHOLD")]
    #[serde(default = "default_big_file_threshold")]
    pub big_file_threshold: u64,

    #[builder(default = "HashAlgorithm::Adler32")]
    #[serde(default = "default_algorithm")]
    pub algorithm: HashAlgorithm,

    /// Walk threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Lines kept by the operation log before the oldest are dropped.
    #[builder(default = "DEFAULT_LOG_CAPACITY")]
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    /// Largest accepted request body in bytes.
    #[builder(default = "DEFAULT_MAX_BODY_BYTES")]
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_big_file_threshold() -> u64 {
    DEFAULT_BIG_FILE_THRESHOLD
}

fn default_algorithm() -> HashAlgorithm {
    HashAlgorithm::Adler32
}

fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

impl ServeConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            Some(_) => {}
        }
        if self.log_capacity == Some(0) {
            return Err("Log capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

impl ServeConfig {
    /// Create a new serve config builder.
    pub fn builder() -> ServeConfigBuilder {
        ServeConfigBuilder::default()
    }

    /// Create a loopback config serving `root` on the default port.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            bind: default_bind(),
            port: DEFAULT_PORT,
            big_file_threshold: DEFAULT_BIG_FILE_THRESHOLD,
            algorithm: HashAlgorithm::Adler32,
            threads: 0,
            log_capacity: DEFAULT_LOG_CAPACITY,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Socket address to listen on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Walk configuration used for every diff request.
    pub fn walk_config(&self) -> WalkConfig {
        WalkConfig {
            root: self.root.clone(),
            big_file_threshold: self.big_file_threshold,
            algorithm: self.algorithm,
            threads: self.threads,
        }
    }
}
