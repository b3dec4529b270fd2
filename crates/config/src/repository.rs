use serde::{Deserialize, Serialize};

use crate::constants::{MAVEN_CENTRAL_NAME, MAVEN_CENTRAL_URL};

/// One remote (or `file://`) repository; list order is lookup order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub name: String,
    pub url: String,
}

impl RepositoryConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    #[must_use]
    pub fn maven_central() -> Self {
        Self::new(MAVEN_CENTRAL_NAME, MAVEN_CENTRAL_URL)
    }
}

pub(crate) fn default_repositories() -> Vec<RepositoryConfig> {
    vec![RepositoryConfig::maven_central()]
}
