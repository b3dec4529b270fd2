//! Resolvable units
//!
//! A [`Unit`] is the single mutable record of one coordinate within a run.
//! Resolution picks one of two metadata sources per unit:
//!
//! 1. The descriptor is read. If it is missing, or flagged as published
//!    with module metadata, the `.module` file is tried first and, when it
//!    parses, variant selection decides children and files.
//! 2. Otherwise the descriptor's inheritance is resolved and its direct
//!    dependencies for the requested scope become children.
//!
//! Problems are recorded as messages on the unit and never abort the run.

use crate::context::ResolutionContext;
use crate::inheritance::{EffectiveProject, InheritanceResolver};
use crate::variant::{select_variant, Selection};
use graft_cache::{ArtifactFile, DownloadState};
use graft_errors::{CacheError, Error, UserFacingError};
use graft_events::{AppEvent, EventEmitter, MetadataSourceKind, ResolverEvent};
use graft_hash::Checksum;
use graft_metadata::{FileRef, ModuleMetadata, Project, Variant, MODULE_EXTENSION};
use graft_types::{ChecksumAlgorithm, Coordinate, Message, ResolutionLevel};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Resolution progress of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Initial,
    Resolved(ResolutionLevel),
}

impl ResolutionState {
    /// Whether a request at `level` has nothing left to do
    #[must_use]
    pub fn covers(self, level: ResolutionLevel) -> bool {
        matches!(self, Self::Resolved(reached) if reached >= level)
    }
}

/// Where a unit's children and files came from
#[derive(Debug, Clone)]
pub enum MetadataSource {
    Descriptor(Arc<EffectiveProject>),
    ModuleMetadata(Arc<ModuleMetadata>),
    Unavailable,
}

impl MetadataSource {
    #[must_use]
    pub fn kind(&self) -> MetadataSourceKind {
        match self {
            Self::Descriptor(_) => MetadataSourceKind::Descriptor,
            Self::ModuleMetadata(_) => MetadataSourceKind::ModuleMetadata,
            Self::Unavailable => MetadataSourceKind::Unavailable,
        }
    }
}

/// Child list shared by identity; replaced, never mutated, when it grows
pub type Children = Arc<Vec<Arc<Unit>>>;

struct UnitData {
    state: ResolutionState,
    source: MetadataSource,
    children: Children,
    variant: Option<Arc<Variant>>,
    packaging: String,
    messages: Vec<Message>,
    files: BTreeMap<String, Arc<ArtifactFile>>,
}

/// Mutable, resolvable representation of one coordinate
pub struct Unit {
    coordinate: Coordinate,
    /// Serializes resolution of this unit; readers use `data` directly
    resolving: tokio::sync::Mutex<()>,
    data: RwLock<UnitData>,
}

impl std::fmt::Debug for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data.read();
        f.debug_struct("Unit")
            .field("coordinate", &self.coordinate)
            .field("state", &data.state)
            .field("children", &data.children.len())
            .field("messages", &data.messages)
            .finish_non_exhaustive()
    }
}

/// What one resolution pass found, applied to the unit in one step
struct Outcome {
    source: MetadataSource,
    children: Vec<Coordinate>,
    variant: Option<Arc<Variant>>,
    packaging: Option<String>,
    files: Vec<ArtifactFile>,
    messages: Vec<Message>,
}

impl Outcome {
    fn new() -> Self {
        Self {
            source: MetadataSource::Unavailable,
            children: Vec::new(),
            variant: None,
            packaging: None,
            files: Vec::new(),
            messages: Vec::new(),
        }
    }
}

/// Descriptor lookup result for step 1
enum Descriptor {
    Present(Arc<Project>),
    Absent(Error),
    Malformed(Error),
    /// The coordinate cannot be stored in the cache at all
    Rejected(Error),
}

impl Unit {
    pub(crate) fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            resolving: tokio::sync::Mutex::new(()),
            data: RwLock::new(UnitData {
                state: ResolutionState::Initial,
                source: MetadataSource::Unavailable,
                children: Arc::new(Vec::new()),
                variant: None,
                packaging: "jar".to_string(),
                messages: Vec::new(),
                files: BTreeMap::new(),
            }),
        }
    }

    #[must_use]
    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    #[must_use]
    pub fn state(&self) -> ResolutionState {
        self.data.read().state
    }

    /// Current child list; the `Arc` changes identity whenever it grows
    #[must_use]
    pub fn children(&self) -> Children {
        Arc::clone(&self.data.read().children)
    }

    #[must_use]
    pub fn source(&self) -> MetadataSource {
        self.data.read().source.clone()
    }

    #[must_use]
    pub fn variant(&self) -> Option<Arc<Variant>> {
        self.data.read().variant.clone()
    }

    #[must_use]
    pub fn packaging(&self) -> String {
        self.data.read().packaging.clone()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.data.read().messages.clone()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.data.read().messages.iter().any(Message::is_error)
    }

    /// Artifact files keyed by extension
    #[must_use]
    pub fn files(&self) -> BTreeMap<String, Arc<ArtifactFile>> {
        self.data.read().files.clone()
    }

    /// Local paths of files that have been made available, keyed by extension
    #[must_use]
    pub fn file_paths(&self) -> BTreeMap<String, PathBuf> {
        self.data
            .read()
            .files
            .iter()
            .filter(|(_, file)| matches!(file.state(), DownloadState::Satisfied(_)))
            .map(|(extension, file)| (extension.clone(), file.path().to_path_buf()))
            .collect()
    }

    /// Resolve this unit at `level`
    ///
    /// Does nothing if the unit already reached `level` or higher. Concurrent
    /// callers wait for the first and then observe its result.
    ///
    /// # Errors
    ///
    /// Only fails with `Cancelled`; every other problem becomes a message.
    pub async fn resolve(&self, ctx: &ResolutionContext, level: ResolutionLevel) -> Result<(), Error> {
        if self.state().covers(level) {
            return Ok(());
        }
        let _resolving = self.resolving.lock().await;
        if self.state().covers(level) {
            return Ok(());
        }
        ctx.check_cancelled()?;

        let outcome = self.load(ctx, level).await;
        self.apply(ctx, level, outcome);
        Ok(())
    }

    async fn load(&self, ctx: &ResolutionContext, level: ResolutionLevel) -> Outcome {
        let mut outcome = Outcome::new();

        let descriptor = match ctx.descriptor(&self.coordinate, level).await {
            Ok(project) => Descriptor::Present(project),
            Err(e @ Error::Metadata(_)) => Descriptor::Malformed(e),
            Err(e @ Error::Cache(CacheError::UnsafePath { .. })) => Descriptor::Rejected(e),
            Err(e) => Descriptor::Absent(e),
        };

        let project = match descriptor {
            Descriptor::Rejected(e) => {
                outcome
                    .messages
                    .push(Message::error("coordinate cannot be cached").with_detail(e.to_string()));
                return outcome;
            }
            Descriptor::Malformed(e) => {
                outcome
                    .messages
                    .push(Message::error("descriptor could not be parsed").with_detail(e.to_string()));
                return outcome;
            }
            Descriptor::Absent(descriptor_error) => {
                match self.module_metadata(ctx, level).await {
                    Ok(metadata) => self.from_metadata(ctx, metadata, &mut outcome),
                    Err(e @ Error::Metadata(_)) => outcome.messages.push(
                        Message::error("module metadata could not be parsed").with_detail(e.to_string()),
                    ),
                    Err(_) => outcome.messages.push(
                        by_level(level, "no descriptor or module metadata available")
                            .with_detail(descriptor_error.user_message().into_owned()),
                    ),
                }
                return outcome;
            }
            Descriptor::Present(project) => project,
        };

        if project.published_with_module_metadata {
            match self.module_metadata(ctx, level).await {
                Ok(metadata) => {
                    self.from_metadata(ctx, metadata, &mut outcome);
                    return outcome;
                }
                Err(e @ Error::Metadata(_)) => outcome.messages.push(
                    Message::warning("module metadata unreadable, using descriptor")
                        .with_detail(e.to_string()),
                ),
                Err(e) => outcome.messages.push(
                    by_level(level, "module metadata announced by descriptor is unavailable")
                        .with_detail(e.user_message().into_owned()),
                ),
            }
        }

        self.from_descriptor(ctx, level, &project, &mut outcome).await;
        outcome
    }

    async fn module_metadata(
        &self,
        ctx: &ResolutionContext,
        level: ResolutionLevel,
    ) -> Result<ModuleMetadata, Error> {
        let file = ctx
            .cache()
            .artifact(&self.coordinate, &self.coordinate.file_name(MODULE_EXTENSION))?;
        let data = ctx.cache().read(&file, level).await?;
        Ok(ModuleMetadata::parse(&data)?)
    }

    fn from_metadata(&self, ctx: &ResolutionContext, metadata: ModuleMetadata, outcome: &mut Outcome) {
        let metadata = Arc::new(metadata);
        let (selection, candidates) =
            select_variant(&metadata, &self.coordinate, ctx.scope(), ctx.platform());

        match selection {
            Selection::Selected(variant) => {
                if let Some(redirect) = &variant.available_at {
                    outcome.children.push(redirect.coordinate());
                } else {
                    outcome.children.extend(
                        variant
                            .dependencies
                            .iter()
                            .filter_map(graft_metadata::VariantDependency::coordinate),
                    );
                    for file in &variant.files {
                        match self.variant_file(ctx, file) {
                            Ok(artifact) => outcome.files.push(artifact),
                            Err(e) => outcome.messages.push(
                                Message::error(format!("variant file {:?} rejected", file.name))
                                    .with_detail(e.to_string()),
                            ),
                        }
                    }
                }
                outcome.variant = Some(Arc::new(variant.clone()));
            }
            Selection::None => {
                tracing::debug!(coordinate = %self.coordinate, "no variant matches");
            }
            Selection::Ambiguous => outcome.messages.push(
                Message::warning("several variants match, none selected")
                    .with_detail(candidates.join(", ")),
            ),
        }
        outcome.source = MetadataSource::ModuleMetadata(metadata);
    }

    fn variant_file(&self, ctx: &ResolutionContext, file: &FileRef) -> Result<ArtifactFile, Error> {
        let embedded = [
            (ChecksumAlgorithm::Sha512, file.sha512.as_deref()),
            (ChecksumAlgorithm::Sha256, file.sha256.as_deref()),
            (ChecksumAlgorithm::Sha1, file.sha1.as_deref()),
        ]
        .into_iter()
        .find_map(|(algorithm, hex)| {
            let hex = hex?;
            match Checksum::from_hex(algorithm, hex) {
                Ok(checksum) => Some(checksum),
                Err(e) => {
                    tracing::warn!(coordinate = %self.coordinate, file = %file.name, error = %e, "ignoring embedded checksum");
                    None
                }
            }
        });
        ctx.cache()
            .artifact_at(&self.coordinate, &file.name, file.remote_path(), embedded)
    }

    async fn from_descriptor(
        &self,
        ctx: &ResolutionContext,
        level: ResolutionLevel,
        project: &Project,
        outcome: &mut Outcome,
    ) {
        let (effective, messages) = InheritanceResolver::new(ctx, level)
            .resolve(&self.coordinate, project)
            .await;
        outcome.messages.extend(messages);

        let scope = ctx.scope();
        outcome.children.extend(
            effective
                .dependencies
                .iter()
                .filter(|dep| !dep.optional && scope.includes_descriptor_scope(dep.scope.as_deref()))
                .map(|dep| dep.coordinate.clone()),
        );
        if !effective.unversioned.is_empty() {
            tracing::debug!(
                coordinate = %self.coordinate,
                skipped = ?effective.unversioned,
                "dependencies without a resolvable version"
            );
        }

        if let Some((extension, name)) = packaged_file(&self.coordinate, &effective.packaging) {
            match ctx.cache().artifact(&self.coordinate, &name) {
                Ok(file) => {
                    outcome.files.push(file);
                    tracing::trace!(coordinate = %self.coordinate, extension, "packaged file");
                }
                Err(e) => outcome.messages.push(
                    Message::error(format!("packaged file {name:?} rejected")).with_detail(e.to_string()),
                ),
            }
        }
        outcome.packaging = Some(effective.packaging.clone());
        outcome.source = MetadataSource::Descriptor(Arc::new(effective));
    }

    /// Fold one pass into the unit: append new children and messages, fill
    /// files and variant once, advance the state
    fn apply(&self, ctx: &ResolutionContext, level: ResolutionLevel, outcome: Outcome) {
        let children: Vec<Arc<Unit>> = outcome
            .children
            .iter()
            .filter(|child| **child != self.coordinate)
            .map(|child| ctx.unit(child))
            .collect();

        let mut data = self.data.write();

        let mut grown: Option<Vec<Arc<Unit>>> = None;
        for child in children {
            let current = grown.as_deref().unwrap_or(data.children.as_slice());
            if current.iter().any(|existing| Arc::ptr_eq(existing, &child)) {
                continue;
            }
            grown
                .get_or_insert_with(|| data.children.as_ref().clone())
                .push(child);
        }
        if let Some(list) = grown {
            data.children = Arc::new(list);
        }

        for file in outcome.files {
            data.files
                .entry(file.extension().to_string())
                .or_insert_with(|| Arc::new(file));
        }
        if data.variant.is_none() {
            data.variant = outcome.variant;
        }
        if let Some(packaging) = outcome.packaging {
            data.packaging = packaging;
        }
        if !matches!(outcome.source, MetadataSource::Unavailable) {
            data.source = outcome.source;
        }
        for message in &outcome.messages {
            record(ctx, &self.coordinate, message);
        }
        data.messages.extend(outcome.messages);
        data.state = ResolutionState::Resolved(level);

        let children = data.children.len();
        let source = data.source.kind();
        drop(data);

        tracing::debug!(coordinate = %self.coordinate, %level, children, "unit resolved");
        ctx.emit(AppEvent::Resolver(ResolverEvent::UnitResolved {
            coordinate: self.coordinate.to_string(),
            level,
            source,
            children,
        }));
    }

    /// Make every file of this unit available at `level`
    ///
    /// Files already satisfied are not fetched again. A file that cannot be
    /// obtained is recorded as a message on this unit; the remaining files
    /// are still attempted.
    pub async fn download_files(&self, ctx: &ResolutionContext, level: ResolutionLevel) -> BTreeMap<String, PathBuf> {
        let files: Vec<(String, Arc<ArtifactFile>)> = self.files().into_iter().collect();
        let handles: Vec<Arc<ArtifactFile>> = files.iter().map(|(_, file)| Arc::clone(file)).collect();
        let results = ctx.cache().ensure_all(&handles, level).await;

        let mut paths = BTreeMap::new();
        let mut failures = Vec::new();
        for ((extension, file), result) in files.into_iter().zip(results) {
            match result {
                Ok(path) => {
                    paths.insert(extension, path);
                }
                // Recorded when it first failed
                Err(Error::Cache(CacheError::PreviouslyFailed { .. })) => {}
                Err(e) => {
                    let text = format!("{} unavailable", file.file_name());
                    let message = if e.is_not_found() {
                        by_level(level, text)
                    } else {
                        Message::error(text)
                    };
                    failures.push(message.with_detail(e.to_string()));
                }
            }
        }

        if !failures.is_empty() {
            for message in &failures {
                record(ctx, &self.coordinate, message);
            }
            self.data.write().messages.extend(failures);
        }
        paths
    }
}

/// ERROR when the network was allowed, WARNING when only the cache was
fn by_level(level: ResolutionLevel, text: impl Into<String>) -> Message {
    match level {
        ResolutionLevel::Network => Message::error(text),
        ResolutionLevel::Local => Message::warning(text),
    }
}

fn record(ctx: &ResolutionContext, coordinate: &Coordinate, message: &Message) {
    if message.is_error() {
        tracing::error!(%coordinate, "{message}");
    } else {
        tracing::warn!(%coordinate, "{message}");
    }
    ctx.emit(AppEvent::Resolver(ResolverEvent::MessageRecorded {
        coordinate: coordinate.to_string(),
        severity: message.severity,
        message: match &message.detail {
            Some(detail) => format!("{} ({detail})", message.text),
            None => message.text.clone(),
        },
    }));
}

/// The file a descriptor's packaging implies, as `(extension, file name)`
///
/// `pom` packaging carries no artifact; bundles and plugins ship jars.
#[must_use]
pub fn packaged_file(coordinate: &Coordinate, packaging: &str) -> Option<(String, String)> {
    let extension = match packaging {
        "pom" => return None,
        "" | "jar" | "bundle" | "maven-plugin" | "eclipse-plugin" => "jar",
        other => other,
    };
    Some((extension.to_string(), coordinate.file_name(extension)))
}
