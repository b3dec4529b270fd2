#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for graft
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/graft/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;
mod sections;
mod repository;
mod resources_semaphore;

pub use sections::{CacheConfig, NetworkConfig, ResolutionConfig};
pub use repository::RepositoryConfig;
pub use resources_semaphore::{acquire_semaphore_permit, create_semaphore};

use graft_errors::{ConfigError, Error};
use graft_types::{ChecksumAlgorithm, ResolutionLevel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default = "repository::default_repositories")]
    pub repositories: Vec<RepositoryConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolution: ResolutionConfig::default(),
            cache: CacheConfig::default(),
            network: NetworkConfig::default(),
            repositories: repository::default_repositories(),
        }
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::CONFIG_DIR_NAME)
            .join(constants::CONFIG_FILE_NAME))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or parsed.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable holds a value that cannot
    /// be parsed into the expected type.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // GRAFT_CACHE_DIR
        if let Ok(dir) = std::env::var("GRAFT_CACHE_DIR") {
            self.cache.root = Some(PathBuf::from(dir));
        }

        // GRAFT_OFFLINE
        if let Ok(offline) = std::env::var("GRAFT_OFFLINE") {
            self.resolution.offline = match offline.as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "GRAFT_OFFLINE".to_string(),
                        value: offline,
                    }
                    .into())
                }
            };
        }

        // GRAFT_PARALLELISM
        if let Ok(parallelism) = std::env::var("GRAFT_PARALLELISM") {
            self.resolution.parallelism =
                parallelism.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "GRAFT_PARALLELISM".to_string(),
                    value: parallelism,
                })?;
        }

        // GRAFT_CHECKSUM
        if let Ok(checksum) = std::env::var("GRAFT_CHECKSUM") {
            self.cache.checksum =
                ChecksumAlgorithm::from_name(&checksum).ok_or_else(|| ConfigError::InvalidValue {
                    field: "GRAFT_CHECKSUM".to_string(),
                    value: checksum,
                })?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), Error> {
        if self.repositories.is_empty() {
            return Err(ConfigError::NoRepositories.into());
        }
        if let Some(repo) = self.repositories.iter().find(|repo| repo.url.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: format!("repositories.{}.url", repo.name),
                value: repo.url.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Get the cache root (with default)
    #[must_use]
    pub fn cache_root(&self) -> PathBuf {
        self.cache.root.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(constants::CACHE_DIR_NAME)
        })
    }

    /// Resolution level implied by the offline switch
    #[must_use]
    pub fn resolution_level(&self) -> ResolutionLevel {
        if self.resolution.offline {
            ResolutionLevel::Local
        } else {
            ResolutionLevel::Network
        }
    }

    /// Effective fan-out width
    #[must_use]
    pub fn parallelism(&self) -> usize {
        calculate_parallelism(self.resolution.parallelism)
    }
}

/// Calculate fan-out width based on CPU count
#[must_use]
pub fn calculate_parallelism(config_value: usize) -> usize {
    if config_value > 0 {
        config_value
    } else {
        // Resolution is I/O bound, so oversubscribe the CPUs
        (num_cpus::get() * 2).clamp(4, 32)
    }
}
