//! Graph nodes
//!
//! A node is a position in the dependency graph. Many nodes can point at
//! the same [`Unit`]; an external conflict resolver may [`rebind`] a node to
//! another version of the same module after resolution.
//!
//! [`rebind`]: DependencyNode::rebind

use crate::unit::{Children, Unit};
use graft_errors::{Error, ResolveError};
use graft_types::Coordinate;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};

/// Child nodes derived from one observed child list
struct ChildrenMemo {
    source: Children,
    nodes: Arc<Vec<Arc<DependencyNode>>>,
}

pub struct DependencyNode {
    unit: RwLock<Arc<Unit>>,
    parent: Option<Weak<DependencyNode>>,
    memo: Mutex<Option<ChildrenMemo>>,
}

impl std::fmt::Debug for DependencyNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyNode")
            .field("coordinate", self.unit.read().coordinate())
            .finish_non_exhaustive()
    }
}

impl DependencyNode {
    /// A root node
    #[must_use]
    pub fn root(unit: Arc<Unit>) -> Arc<Self> {
        Arc::new(Self {
            unit: RwLock::new(unit),
            parent: None,
            memo: Mutex::new(None),
        })
    }

    fn child_of(parent: &Arc<Self>, unit: Arc<Unit>) -> Arc<Self> {
        Arc::new(Self {
            unit: RwLock::new(unit),
            parent: Some(Arc::downgrade(parent)),
            memo: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn unit(&self) -> Arc<Unit> {
        Arc::clone(&self.unit.read())
    }

    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        self.unit.read().coordinate().clone()
    }

    /// The node this one was reached from, while it is alive
    #[must_use]
    pub fn parent(&self) -> Option<Arc<Self>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Coordinates from the root down to this node
    #[must_use]
    pub fn path(&self) -> Vec<Coordinate> {
        let mut path = vec![self.coordinate()];
        let mut current = self.parent();
        while let Some(node) = current {
            path.push(node.coordinate());
            current = node.parent();
        }
        path.reverse();
        path
    }

    /// Child nodes, rebuilt only when the unit's child list changed identity
    /// since the last call
    #[must_use]
    pub fn children(self: &Arc<Self>) -> Arc<Vec<Arc<Self>>> {
        let source = self.unit().children();
        let mut memo = self.memo.lock();
        if let Some(memo) = memo.as_ref() {
            if Arc::ptr_eq(&memo.source, &source) {
                return Arc::clone(&memo.nodes);
            }
        }

        let nodes: Arc<Vec<Arc<Self>>> = Arc::new(
            source
                .iter()
                .map(|unit| Self::child_of(self, Arc::clone(unit)))
                .collect(),
        );
        *memo = Some(ChildrenMemo {
            source,
            nodes: Arc::clone(&nodes),
        });
        nodes
    }

    /// Point this node at another unit of the same module
    ///
    /// # Errors
    ///
    /// Returns `RebindMismatch` if `unit` has a different group or module.
    pub fn rebind(&self, unit: Arc<Unit>) -> Result<(), Error> {
        let mut current = self.unit.write();
        if !current.coordinate().same_module(unit.coordinate()) {
            return Err(ResolveError::RebindMismatch {
                expected: current.coordinate().to_string(),
                actual: unit.coordinate().to_string(),
            }
            .into());
        }
        tracing::debug!(
            from = %current.coordinate(),
            to = %unit.coordinate(),
            "node rebound"
        );
        *current = unit;
        Ok(())
    }
}
