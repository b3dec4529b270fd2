//! Per-run resolution context
//!
//! Everything a unit needs while resolving is reached through the context:
//! the requested scope and platform, the file cache (and through it the
//! repositories), and the de-duplication table that guarantees one [`Unit`]
//! per coordinate for the lifetime of the run.

use crate::unit::Unit;
use dashmap::DashMap;
use graft_cache::FileCache;
use graft_config::Config;
use graft_errors::Error;
use graft_events::{EventEmitter, EventSender};
use graft_metadata::{Project, DESCRIPTOR_EXTENSION};
use graft_types::{Coordinate, Platform, ResolutionLevel, Scope};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Immutable settings of one resolution run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolutionSettings {
    pub scope: Scope,
    pub platform: Platform,
}

impl ResolutionSettings {
    #[must_use]
    pub fn new(scope: Scope, platform: Platform) -> Self {
        Self { scope, platform }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.resolution.scope, config.resolution.platform)
    }
}

/// Shared flag that stops a running traversal
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Resolution context shared by every unit of one run
pub struct ResolutionContext {
    settings: ResolutionSettings,
    cache: Arc<FileCache>,
    units: DashMap<Coordinate, Arc<Unit>>,
    /// Parsed descriptors, with the level they were read at
    descriptors: DashMap<Coordinate, (ResolutionLevel, Arc<Project>)>,
    cancel: CancelHandle,
    tx: Option<EventSender>,
}

impl EventEmitter for ResolutionContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl ResolutionContext {
    #[must_use]
    pub fn new(settings: ResolutionSettings, cache: Arc<FileCache>) -> Self {
        Self {
            settings,
            cache,
            units: DashMap::new(),
            descriptors: DashMap::new(),
            cancel: CancelHandle::default(),
            tx: None,
        }
    }

    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn settings(&self) -> ResolutionSettings {
        self.settings
    }

    #[must_use]
    pub fn scope(&self) -> Scope {
        self.settings.scope
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.settings.platform
    }

    #[must_use]
    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    /// The unit for `coordinate`, created on first reference
    ///
    /// Concurrent first lookups of the same coordinate observe the same
    /// instance.
    #[must_use]
    pub fn unit(&self, coordinate: &Coordinate) -> Arc<Unit> {
        if let Some(existing) = self.units.get(coordinate) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.units
                .entry(coordinate.clone())
                .or_insert_with(|| Arc::new(Unit::new(coordinate.clone())))
                .value(),
        )
    }

    /// Number of units created so far
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Handle that cancels traversals running on this context
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail with [`Error::Cancelled`] once cancellation was requested
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` if the run was cancelled.
    pub fn check_cancelled(&self) -> Result<(), Error> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Read and parse the descriptor of `coordinate`
    ///
    /// Parsed descriptors are shared across units; a copy read at `Local`
    /// level is not reused for a `Network` request.
    ///
    /// # Errors
    ///
    /// Returns the cache error if the file cannot be obtained at `level`, or
    /// a metadata error if it does not parse.
    pub async fn descriptor(
        &self,
        coordinate: &Coordinate,
        level: ResolutionLevel,
    ) -> Result<Arc<Project>, Error> {
        if let Some(entry) = self.descriptors.get(coordinate) {
            let (read_at, project) = entry.value();
            if *read_at >= level {
                return Ok(Arc::clone(project));
            }
        }

        let file = self
            .cache
            .artifact(coordinate, &coordinate.file_name(DESCRIPTOR_EXTENSION))?;
        let data = self.cache.read(&file, level).await?;
        let project = Arc::new(Project::parse_bytes(&data)?);
        self.descriptors
            .insert(coordinate.clone(), (level, Arc::clone(&project)));
        Ok(project)
    }
}
