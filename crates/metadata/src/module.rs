//! Module metadata (`.module` JSON) model

use graft_errors::MetadataError;
use graft_types::Coordinate;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Parsed module metadata document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMetadata {
    pub format_version: String,
    #[serde(default)]
    pub component: Option<Component>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

/// The `component` block naming the publishing module
#[derive(Debug, Clone, Deserialize)]
pub struct Component {
    pub group: String,
    pub module: String,
    pub version: String,
}

/// A named, attribute-tagged set of files and dependencies
#[derive(Debug, Clone, Deserialize)]
pub struct Variant {
    pub name: String,
    #[serde(default, deserialize_with = "stringified_attributes")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub dependencies: Vec<VariantDependency>,
    #[serde(default, rename = "available-at")]
    pub available_at: Option<AvailableAt>,
    #[serde(default)]
    pub files: Vec<FileRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Capability {
    pub group: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantDependency {
    pub group: String,
    pub module: String,
    #[serde(default)]
    pub version: Option<VersionConstraint>,
    #[serde(default)]
    pub excludes: Vec<ExcludeRule>,
}

/// Rich version constraint; only single versions are honoured
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionConstraint {
    #[serde(default)]
    pub strictly: Option<String>,
    #[serde(default)]
    pub requires: Option<String>,
    #[serde(default)]
    pub prefers: Option<String>,
    #[serde(default)]
    pub rejects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExcludeRule {
    pub group: String,
    pub module: String,
}

/// Redirect to the module that really hosts a variant
#[derive(Debug, Clone, Deserialize)]
pub struct AvailableAt {
    pub url: String,
    pub group: String,
    pub module: String,
    pub version: String,
}

/// A file belonging to a variant
#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    pub name: String,
    /// Location relative to the metadata file's directory; the name when absent
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub sha512: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl ModuleMetadata {
    /// Parse a module metadata document
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON of the expected
    /// shape or declares a format version other than `1.x`.
    pub fn parse(data: &[u8]) -> Result<Self, MetadataError> {
        let metadata: Self =
            serde_json::from_slice(data).map_err(|e| MetadataError::MalformedModule {
                message: e.to_string(),
            })?;
        if !metadata.format_version.starts_with("1.") {
            return Err(MetadataError::UnsupportedFormat {
                version: metadata.format_version,
            });
        }
        tracing::trace!(
            component = ?metadata.component,
            variants = metadata.variants.len(),
            "parsed module metadata"
        );
        Ok(metadata)
    }
}

impl VersionConstraint {
    /// The single version to resolve: strictly, then requires, then prefers
    #[must_use]
    pub fn preferred(&self) -> Option<&str> {
        self.strictly
            .as_deref()
            .or(self.requires.as_deref())
            .or(self.prefers.as_deref())
            .filter(|version| !version.is_empty())
    }
}

impl VariantDependency {
    /// Coordinate of the dependency, if it names a concrete version
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        let version = self.version.as_ref()?.preferred()?;
        Some(Coordinate::new(&self.group, &self.module, version))
    }
}

impl AvailableAt {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(&self.group, &self.module, &self.version)
    }
}

impl Variant {
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

impl FileRef {
    /// Extension used to key the file on its unit (`jar`, `klib`, ...)
    #[must_use]
    pub fn extension(&self) -> &str {
        self.name.rsplit_once('.').map_or("", |(_, ext)| ext)
    }

    #[must_use]
    pub fn remote_path(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.name)
    }
}

/// Attribute values are strings, booleans or numbers; keep them all as text
fn stringified_attributes<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_preference_order() {
        let constraint = VersionConstraint {
            strictly: None,
            requires: Some("1.2".into()),
            prefers: Some("1.3".into()),
            rejects: Vec::new(),
        };
        assert_eq!(constraint.preferred(), Some("1.2"));

        let strict = VersionConstraint {
            strictly: Some("1.0".into()),
            ..constraint
        };
        assert_eq!(strict.preferred(), Some("1.0"));
        assert_eq!(VersionConstraint::default().preferred(), None);
    }

    #[test]
    fn test_unsupported_format_version() {
        let err = ModuleMetadata::parse(br#"{"formatVersion": "2.0", "variants": []}"#).unwrap_err();
        assert!(matches!(err, MetadataError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_file_extension() {
        let file = FileRef {
            name: "kotlin-stdlib-2.0.0.klib".into(),
            url: None,
            size: None,
            sha512: None,
            sha256: None,
            sha1: None,
        };
        assert_eq!(file.extension(), "klib");
        assert_eq!(file.remote_path(), "kotlin-stdlib-2.0.0.klib");
    }

    #[test]
    fn test_file_without_url() {
        let metadata = ModuleMetadata::parse(
            br#"{
  "formatVersion": "1.1",
  "variants": [
    {"name": "runtime", "files": [{"name": "nourl-1.0.jar", "sha256": "ab"}]}
  ]
}"#,
        )
        .unwrap();
        let file = &metadata.variants[0].files[0];
        assert!(file.url.is_none());
        assert_eq!(file.remote_path(), "nourl-1.0.jar");
    }
}
