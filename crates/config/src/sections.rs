//! Configuration sections

use graft_types::{ChecksumAlgorithm, Platform, Scope};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to resolve and how wide to fan out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub platform: Platform,
    /// Concurrent unit resolutions and downloads; 0 = auto-detect
    #[serde(default)]
    pub parallelism: usize,
    /// Never touch the network
    #[serde(default)]
    pub offline: bool,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            scope: Scope::Compile,
            platform: Platform::Jvm,
            parallelism: 0,
            offline: false,
        }
    }
}

/// Local artifact cache
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub checksum: ChecksumAlgorithm,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64, // milliseconds
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            retries: default_retries(),
            retry_delay: default_retry_delay(),
        }
    }
}

fn default_timeout() -> u64 {
    120
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    500
}
