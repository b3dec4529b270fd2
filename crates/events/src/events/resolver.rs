use graft_types::{ResolutionLevel, Severity};
use serde::{Deserialize, Serialize};

/// Where a unit's dependency list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataSourceKind {
    Descriptor,
    ModuleMetadata,
    Unavailable,
}

/// Resolver domain events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResolverEvent {
    /// Graph traversal started
    ResolutionStarted {
        roots: Vec<String>,
        level: ResolutionLevel,
        parallelism: usize,
    },

    /// One unit reached a new resolution level
    UnitResolved {
        coordinate: String,
        level: ResolutionLevel,
        source: MetadataSourceKind,
        children: usize,
    },

    /// Diagnostic attached to a unit
    MessageRecorded {
        coordinate: String,
        severity: Severity,
        message: String,
    },

    /// Graph traversal finished
    ResolutionCompleted {
        units: usize,
        errors: usize,
        warnings: usize,
        duration_ms: u64,
    },

    /// Traversal stopped early on request
    Cancelled { units_resolved: usize },
}
