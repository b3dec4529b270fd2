//! Graph traversal and resolved graph views

use crate::context::ResolutionContext;
use crate::node::DependencyNode;
use crate::unit::Unit;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use graft_config::{acquire_semaphore_permit, create_semaphore};
use graft_errors::Error;
use graft_events::{AppEvent, EventEmitter, ResolverEvent};
use graft_types::{Coordinate, Message, ResolutionLevel, Severity};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Resolve `roots` and everything reachable from them
///
/// Units are resolved breadth-first with at most `parallelism` resolutions
/// in flight. Each unit is resolved once per level; shared sub-graphs are
/// visited once.
///
/// # Errors
///
/// Returns `Cancelled` if the context is cancelled before traversal ends.
pub async fn resolve_graph(
    ctx: &ResolutionContext,
    roots: &[Coordinate],
    level: ResolutionLevel,
    parallelism: usize,
) -> Result<ResolvedGraph, Error> {
    let started = Instant::now();
    let width = parallelism.max(1);
    ctx.emit(AppEvent::Resolver(ResolverEvent::ResolutionStarted {
        roots: roots.iter().map(ToString::to_string).collect(),
        level,
        parallelism: width,
    }));

    let root_units: Vec<Arc<Unit>> = roots.iter().map(|root| ctx.unit(root)).collect();
    let mut seen: HashSet<Coordinate> = HashSet::new();
    let mut order: Vec<Arc<Unit>> = Vec::new();
    let mut pending: VecDeque<Arc<Unit>> = VecDeque::new();
    for unit in &root_units {
        if seen.insert(unit.coordinate().clone()) {
            order.push(Arc::clone(unit));
            pending.push_back(Arc::clone(unit));
        }
    }

    let mut in_flight = FuturesUnordered::new();
    loop {
        while in_flight.len() < width {
            let Some(unit) = pending.pop_front() else {
                break;
            };
            if ctx.is_cancelled() {
                return Err(cancelled(ctx, &order));
            }
            in_flight.push(async move {
                let result = unit.resolve(ctx, level).await;
                (unit, result)
            });
        }

        let Some((unit, result)) = in_flight.next().await else {
            break;
        };
        if let Err(e) = result {
            return Err(match e {
                Error::Cancelled => cancelled(ctx, &order),
                other => other,
            });
        }
        if ctx.is_cancelled() {
            return Err(cancelled(ctx, &order));
        }

        for child in unit.children().iter() {
            if seen.insert(child.coordinate().clone()) {
                order.push(Arc::clone(child));
                pending.push_back(Arc::clone(child));
            }
        }
    }

    let graph = ResolvedGraph {
        roots: root_units.into_iter().map(DependencyNode::root).collect(),
        units: order,
    };
    let (errors, warnings) = graph.message_counts();
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::info!(
        units = graph.units.len(),
        errors,
        warnings,
        duration_ms,
        "resolution completed"
    );
    ctx.emit(AppEvent::Resolver(ResolverEvent::ResolutionCompleted {
        units: graph.units.len(),
        errors,
        warnings,
        duration_ms,
    }));
    Ok(graph)
}

fn cancelled(ctx: &ResolutionContext, order: &[Arc<Unit>]) -> Error {
    let units_resolved = order
        .iter()
        .filter(|unit| !matches!(unit.state(), crate::ResolutionState::Initial))
        .count();
    tracing::info!(units_resolved, "resolution cancelled");
    ctx.emit(AppEvent::Resolver(ResolverEvent::Cancelled { units_resolved }));
    Error::Cancelled
}

/// Roots plus every distinct unit reachable from them
#[derive(Debug, Clone)]
pub struct ResolvedGraph {
    roots: Vec<Arc<DependencyNode>>,
    /// Breadth-first discovery order
    units: Vec<Arc<Unit>>,
}

impl ResolvedGraph {
    #[must_use]
    pub fn roots(&self) -> &[Arc<DependencyNode>] {
        &self.roots
    }

    /// Distinct units in discovery order
    #[must_use]
    pub fn units(&self) -> &[Arc<Unit>] {
        &self.units
    }

    /// Every message with the coordinate of the unit that recorded it
    #[must_use]
    pub fn messages(&self) -> Vec<(Coordinate, Message)> {
        self.units
            .iter()
            .flat_map(|unit| {
                let coordinate = unit.coordinate().clone();
                unit.messages()
                    .into_iter()
                    .map(move |message| (coordinate.clone(), message))
            })
            .collect()
    }

    /// `(errors, warnings)`
    #[must_use]
    pub fn message_counts(&self) -> (usize, usize) {
        self.units
            .iter()
            .flat_map(|unit| unit.messages())
            .fold((0, 0), |(errors, warnings), message| match message.severity {
                Severity::Error => (errors + 1, warnings),
                Severity::Warning => (errors, warnings + 1),
            })
    }

    /// Whether any unit recorded an error. What that means for the build is
    /// up to the caller.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.units.iter().any(|unit| unit.has_errors())
    }

    /// Local files per coordinate, for units whose files are available
    #[must_use]
    pub fn files(&self) -> BTreeMap<Coordinate, BTreeMap<String, PathBuf>> {
        self.units
            .iter()
            .map(|unit| (unit.coordinate().clone(), unit.file_paths()))
            .filter(|(_, files)| !files.is_empty())
            .collect()
    }

    /// Flattened artifact paths in discovery order, without duplicates
    #[must_use]
    pub fn classpath(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.units
            .iter()
            .flat_map(|unit| unit.file_paths().into_values())
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }

    /// Download the files of every unit, at most `parallelism` units at a
    /// time
    ///
    /// Failures are recorded on the owning unit.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` if the context was cancelled.
    pub async fn materialize(
        &self,
        ctx: &ResolutionContext,
        level: ResolutionLevel,
        parallelism: usize,
    ) -> Result<(), Error> {
        let permits = create_semaphore(parallelism);
        let downloads = self.units.iter().map(|unit| {
            let permits = Arc::clone(&permits);
            async move {
                let _permit = acquire_semaphore_permit(permits, "download").await?;
                ctx.check_cancelled()?;
                unit.download_files(ctx, level).await;
                Ok::<(), Error>(())
            }
        });

        for result in futures::future::join_all(downloads).await {
            result?;
        }
        Ok(())
    }
}
