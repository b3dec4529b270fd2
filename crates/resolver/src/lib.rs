#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Dependency resolution for graft
//!
//! Turns requested coordinates into a de-duplicated dependency graph by
//! reading project descriptors and module metadata through the artifact
//! cache. Units are resolved concurrently; each coordinate is resolved once
//! per run, however many paths lead to it.

mod context;
mod graph;
mod inheritance;
mod node;
mod unit;
mod variant;

pub use context::{CancelHandle, ResolutionContext, ResolutionSettings};
pub use graph::{resolve_graph, ResolvedGraph};
pub use inheritance::{
    expand_placeholders, EffectiveProject, ManagedDependency, ResolvedDependency,
    MAX_INHERITANCE_DEPTH,
};
pub use node::DependencyNode;
pub use unit::{packaged_file, Children, MetadataSource, ResolutionState, Unit};
pub use variant::{select_variant, Selection};
