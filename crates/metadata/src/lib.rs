#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Metadata parsers for graft
//!
//! Two independent formats describe a published module:
//! - the project descriptor (`.pom`), XML with parent inheritance
//! - module metadata (`.module`), JSON with attribute-tagged variants
//!
//! Both parsers are pure: bytes in, typed model out. Inheritance and
//! variant selection live in the resolver.

pub mod module;
pub mod pom;

pub use module::{
    AvailableAt, Capability, Component, ExcludeRule, FileRef, ModuleMetadata, Variant,
    VariantDependency, VersionConstraint,
};
pub use pom::{DependencyDecl, Exclusion, ParentRef, Project, MODULE_METADATA_MARKER};

/// File extension of the project descriptor
pub const DESCRIPTOR_EXTENSION: &str = "pom";

/// File extension of module metadata
pub const MODULE_EXTENSION: &str = "module";
