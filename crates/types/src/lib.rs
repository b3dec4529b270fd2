#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for graft
//!
//! Coordinates, resolution settings and diagnostics shared by every crate
//! in the workspace.

pub mod coordinate;
pub mod message;

pub use coordinate::Coordinate;
pub use message::{Message, Severity};

use serde::{Deserialize, Serialize};
use std::fmt;

/// How far resolution may reach for files
///
/// `Local` only looks at the on-disk cache; `Network` may download.
/// Ordered so that `Network` satisfies anything `Local` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionLevel {
    Local,
    Network,
}

impl fmt::Display for ResolutionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// Dependency scope requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Compile,
    Runtime,
    Test,
}

impl Scope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Runtime => "runtime",
            Self::Test => "test",
        }
    }

    /// Whether a transitive descriptor dependency declared with `scope`
    /// belongs on this scope's classpath. Absent scope means `compile`.
    #[must_use]
    pub fn includes_descriptor_scope(self, scope: Option<&str>) -> bool {
        match (self, scope.unwrap_or("compile")) {
            (_, "compile") => true,
            (Self::Runtime | Self::Test, "runtime") => true,
            _ => false,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl clap::ValueEnum for Scope {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Compile, Self::Runtime, Self::Test]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

/// Kotlin target platform, as written in the `org.jetbrains.kotlin.platform.type`
/// variant attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Platform {
    #[default]
    #[serde(rename = "jvm")]
    Jvm,
    #[serde(rename = "androidJvm")]
    AndroidJvm,
    #[serde(rename = "native")]
    Native,
    #[serde(rename = "js")]
    Js,
    #[serde(rename = "wasm")]
    Wasm,
    #[serde(rename = "common")]
    Common,
}

impl Platform {
    /// Attribute value used in module metadata
    #[must_use]
    pub fn as_attribute(self) -> &'static str {
        match self {
            Self::Jvm => "jvm",
            Self::AndroidJvm => "androidJvm",
            Self::Native => "native",
            Self::Js => "js",
            Self::Wasm => "wasm",
            Self::Common => "common",
        }
    }

    /// Matching `org.gradle.jvm.environment` value, for JVM-flavoured platforms
    #[must_use]
    pub fn jvm_environment(self) -> Option<&'static str> {
        match self {
            Self::Jvm => Some("standard-jvm"),
            Self::AndroidJvm => Some("android"),
            _ => None,
        }
    }

    /// Parse the attribute spelling
    #[must_use]
    pub fn from_attribute(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|platform| platform.as_attribute().eq_ignore_ascii_case(value))
    }

    const ALL: [Self; 6] = [
        Self::Jvm,
        Self::AndroidJvm,
        Self::Native,
        Self::Js,
        Self::Wasm,
        Self::Common,
    ];
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_attribute())
    }
}

impl clap::ValueEnum for Platform {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_attribute()))
    }
}

/// Digest used for artifact checksum files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Sha256,
    Sha512,
    Sha1,
}

impl ChecksumAlgorithm {
    /// Extension of the checksum sidecar file, without the dot
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Sha1 => "sha1",
        }
    }

    /// Digest length in bytes
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha512 => 64,
            Self::Sha1 => 20,
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            "sha1" => Some(Self::Sha1),
            _ => None,
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
