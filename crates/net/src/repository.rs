//! Remote repository addressing

use graft_config::RepositoryConfig;
use graft_errors::{Error, NetworkError};
use graft_types::Coordinate;
use url::Url;

/// A Maven-layout repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    name: String,
    base: Url,
}

impl Repository {
    /// Create a repository rooted at `url`
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid absolute URL.
    pub fn new(name: impl Into<String>, url: &str) -> Result<Self, Error> {
        let normalized = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        };
        let base = Url::parse(&normalized).map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            name: name.into(),
            base,
        })
    }

    /// Build from a configuration entry
    ///
    /// # Errors
    ///
    /// Returns an error if the configured URL is invalid.
    pub fn from_config(config: &RepositoryConfig) -> Result<Self, Error> {
        Self::new(config.name.clone(), &config.url)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL of `file_name` in the directory of `coordinate`
    ///
    /// # Errors
    ///
    /// Returns an error if the joined path does not form a valid URL.
    pub fn artifact_url(&self, coordinate: &Coordinate, file_name: &str) -> Result<Url, Error> {
        self.base
            .join(&format!("{}/{file_name}", coordinate.repository_path()))
            .map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_url_layout() {
        let repo = Repository::new("central", "https://repo.maven.apache.org/maven2").unwrap();
        let coord = Coordinate::new("com.google.guava", "guava", "33.0.0-jre");
        let url = repo.artifact_url(&coord, "guava-33.0.0-jre.pom").unwrap();
        assert_eq!(
            url.as_str(),
            "https://repo.maven.apache.org/maven2/com/google/guava/guava/33.0.0-jre/guava-33.0.0-jre.pom"
        );
    }

    #[test]
    fn test_invalid_repository_url() {
        assert!(Repository::new("broken", "not a url").is_err());
    }
}
