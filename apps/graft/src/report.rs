//! Command results in a renderable, serializable shape

use graft_cache::CacheStatsSnapshot;
use graft_events::MetadataSourceKind;
use graft_resolver::{DependencyNode, ResolvedGraph, Unit};
use graft_types::{Coordinate, Message};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

/// Error and warning totals over the whole graph
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Summary {
    pub units: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl Summary {
    fn of(graph: &ResolvedGraph) -> Self {
        let (errors, warnings) = graph.message_counts();
        Self {
            units: graph.units().len(),
            errors,
            warnings,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub coordinate: String,
    pub source: MetadataSourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub packaging: String,
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

impl UnitReport {
    fn of(unit: &Unit) -> Self {
        Self {
            coordinate: unit.coordinate().to_string(),
            source: unit.source().kind(),
            variant: unit.variant().map(|variant| variant.name.clone()),
            packaging: unit.packaging(),
            dependencies: unit
                .children()
                .iter()
                .map(|child| child.coordinate().to_string())
                .collect(),
            files: unit.file_paths(),
            messages: unit.messages(),
        }
    }
}

/// One line of the dependency tree
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub coordinate: String,
    pub source: MetadataSourceKind,
    /// Already expanded elsewhere in the tree
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub repeated: bool,
    /// Points back at one of its own ancestors
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cycle: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn build(
        node: &Arc<DependencyNode>,
        ancestors: &mut Vec<Coordinate>,
        expanded: &mut HashSet<Coordinate>,
    ) -> Self {
        let unit = node.unit();
        let coordinate = unit.coordinate().clone();
        let mut tree = Self {
            coordinate: coordinate.to_string(),
            source: unit.source().kind(),
            repeated: false,
            cycle: false,
            messages: unit.messages(),
            children: Vec::new(),
        };

        if ancestors.contains(&coordinate) {
            tree.cycle = true;
            return tree;
        }
        if !expanded.insert(coordinate.clone()) {
            tree.repeated = true;
            tree.messages.clear();
            return tree;
        }

        ancestors.push(coordinate);
        tree.children = node
            .children()
            .iter()
            .map(|child| Self::build(child, ancestors, expanded))
            .collect();
        ancestors.pop();
        tree
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheReport {
    pub hits: u64,
    pub downloads: u64,
    pub bytes_downloaded: u64,
    pub failures: u64,
}

impl From<CacheStatsSnapshot> for CacheReport {
    fn from(stats: CacheStatsSnapshot) -> Self {
        Self {
            hits: stats.hits,
            downloads: stats.downloads,
            bytes_downloaded: stats.bytes_downloaded,
            failures: stats.failures,
        }
    }
}

/// Result of a CLI command
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandOutput {
    Resolve {
        roots: Vec<String>,
        units: Vec<UnitReport>,
        summary: Summary,
    },
    Tree {
        roots: Vec<TreeNode>,
        summary: Summary,
    },
    Classpath {
        entries: Vec<PathBuf>,
        messages: Vec<(String, Message)>,
        summary: Summary,
    },
    Fetch {
        units: Vec<UnitReport>,
        cache: CacheReport,
        summary: Summary,
    },
}

impl CommandOutput {
    pub fn resolve(graph: &ResolvedGraph) -> Self {
        Self::Resolve {
            roots: graph
                .roots()
                .iter()
                .map(|root| root.coordinate().to_string())
                .collect(),
            units: graph.units().iter().map(|unit| UnitReport::of(unit)).collect(),
            summary: Summary::of(graph),
        }
    }

    pub fn tree(graph: &ResolvedGraph) -> Self {
        let mut expanded = HashSet::new();
        let roots = graph
            .roots()
            .iter()
            .map(|root| TreeNode::build(root, &mut Vec::new(), &mut expanded))
            .collect();
        Self::Tree {
            roots,
            summary: Summary::of(graph),
        }
    }

    pub fn classpath(graph: &ResolvedGraph) -> Self {
        Self::Classpath {
            entries: graph.classpath(),
            messages: graph
                .messages()
                .into_iter()
                .map(|(coordinate, message)| (coordinate.to_string(), message))
                .collect(),
            summary: Summary::of(graph),
        }
    }

    pub fn fetch(graph: &ResolvedGraph, stats: CacheStatsSnapshot) -> Self {
        Self::Fetch {
            units: graph.units().iter().map(|unit| UnitReport::of(unit)).collect(),
            cache: stats.into(),
            summary: Summary::of(graph),
        }
    }

    pub fn summary(&self) -> Summary {
        match self {
            Self::Resolve { summary, .. }
            | Self::Tree { summary, .. }
            | Self::Classpath { summary, .. }
            | Self::Fetch { summary, .. } => *summary,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serializes_counts() {
        let output = CommandOutput::Classpath {
            entries: vec![PathBuf::from("/cache/a.jar")],
            messages: vec![(
                "g:a:1".to_string(),
                Message::warning("module metadata unreadable, using descriptor"),
            )],
            summary: Summary {
                units: 1,
                errors: 0,
                warnings: 1,
            },
        };

        let json: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
        assert_eq!(json["command"], "classpath");
        assert_eq!(json["entries"][0], "/cache/a.jar");
        assert_eq!(json["summary"]["warnings"], 1);
        assert_eq!(json["messages"][0][1]["severity"], "warning");
    }
}
