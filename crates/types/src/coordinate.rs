//! Dependency coordinates

use graft_errors::{Error, ResolveError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `group:module:version` triple identifying one published module version.
///
/// Coordinates compare by value; two coordinates with the same group and
/// module but different versions are distinct.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub group: String,
    pub module: String,
    pub version: String,
}

impl Coordinate {
    /// Create a new coordinate
    pub fn new(
        group: impl Into<String>,
        module: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            module: module.into(),
            version: version.into(),
        }
    }

    /// Parse `group:module:version`
    ///
    /// # Errors
    ///
    /// Returns an error unless the input has exactly three non-empty parts.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let parts: Vec<&str> = input.trim().split(':').collect();
        match parts.as_slice() {
            [group, module, version]
                if !group.is_empty() && !module.is_empty() && !version.is_empty() =>
            {
                Ok(Self::new(*group, *module, *version))
            }
            _ => Err(ResolveError::InvalidCoordinate {
                input: input.to_string(),
            }
            .into()),
        }
    }

    /// Whether `other` names the same module, ignoring version
    #[must_use]
    pub fn same_module(&self, other: &Coordinate) -> bool {
        self.group == other.group && self.module == other.module
    }

    /// Standard file name for an artifact of this coordinate
    #[must_use]
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}-{}.{extension}", self.module, self.version)
    }

    /// Repository-relative directory (`org/example/lib/1.0`)
    #[must_use]
    pub fn repository_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.group.replace('.', "/"),
            self.module,
            self.version
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.module, self.version)
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
