#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Artifact file cache for graft
//!
//! Files live under `root/group/module/version/file`, each next to a
//! checksum sidecar (`file.sha256`, ...) and a lock file (`file.lock`).
//! [`FileCache::ensure`] is the check-then-download critical section: it
//! holds the path lock while deciding whether the cached copy is good
//! enough for the requested [`ResolutionLevel`] and downloading if not.
//!
//! Satisfaction rules:
//! - `Local`: the file exists. A checksum mismatch is logged but tolerated.
//! - `Network`: the file exists and matches its expected checksum (embedded
//!   in metadata, or recorded in the local sidecar). No checksum means no
//!   proof, so the file is fetched again.

mod artifact;
mod lock;
mod stats;

pub use artifact::{ArtifactFile, DownloadState};
pub use lock::{lock_path_for, PathLock};
pub use stats::CacheStatsSnapshot;

use bytes::Bytes;
use graft_errors::{CacheError, Error};
use graft_events::{AppEvent, DownloadEvent, EventEmitter, EventSender};
use graft_hash::{verify_file, Checksum};
use graft_net::{Fetcher, Repository};
use graft_types::{ChecksumAlgorithm, Coordinate, ResolutionLevel};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use lock::LockTable;
use stats::CacheStats;

/// Download-or-reuse logic over an on-disk cache directory
pub struct FileCache {
    root: PathBuf,
    algorithm: ChecksumAlgorithm,
    repositories: Vec<Repository>,
    fetcher: Arc<dyn Fetcher>,
    locks: LockTable,
    stats: CacheStats,
    tx: Option<EventSender>,
}

impl EventEmitter for FileCache {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl FileCache {
    /// Create a cache rooted at `root`, fetching from `repositories` in order
    pub fn new(
        root: impl Into<PathBuf>,
        repositories: Vec<Repository>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            root: root.into(),
            algorithm: ChecksumAlgorithm::default(),
            repositories,
            fetcher,
            locks: LockTable::default(),
            stats: CacheStats::default(),
            tx: None,
        }
    }

    /// Digest used for sidecars when metadata embeds none
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    #[must_use]
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Local path of `file_name` for `coordinate`
    ///
    /// Every coordinate segment and the file name must be a single plain
    /// path component, so the result always lies under the cache root.
    ///
    /// # Errors
    ///
    /// Returns `UnsafePath` for an empty segment, `.`, `..`, or a segment
    /// containing a path separator.
    pub fn path_for(&self, coordinate: &Coordinate, file_name: &str) -> Result<PathBuf, Error> {
        Ok(self
            .root
            .join(checked_segment("group", &coordinate.group)?)
            .join(checked_segment("module", &coordinate.module)?)
            .join(checked_segment("version", &coordinate.version)?)
            .join(checked_segment("file name", file_name)?))
    }

    /// Describe a file stored under its own name in the coordinate's
    /// repository directory
    ///
    /// # Errors
    ///
    /// Same as [`FileCache::path_for`].
    pub fn artifact(&self, coordinate: &Coordinate, file_name: &str) -> Result<ArtifactFile, Error> {
        self.artifact_at(coordinate, file_name, file_name, None)
    }

    /// Describe a file whose remote location or expected checksum is known
    /// from metadata
    ///
    /// # Errors
    ///
    /// Same as [`FileCache::path_for`].
    pub fn artifact_at(
        &self,
        coordinate: &Coordinate,
        file_name: &str,
        remote_path: &str,
        expected: Option<Checksum>,
    ) -> Result<ArtifactFile, Error> {
        Ok(ArtifactFile::new(
            coordinate.clone(),
            file_name.to_string(),
            remote_path.to_string(),
            self.path_for(coordinate, file_name)?,
            expected,
        ))
    }

    /// Whether the cached copy is good enough for `level`
    pub async fn is_satisfied(&self, file: &ArtifactFile, level: ResolutionLevel) -> bool {
        let path = file.path();
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return false;
        }

        let expected = match file.expected_checksum() {
            Some(checksum) => Some(checksum.clone()),
            None => self.local_sidecar(path).await,
        };

        match (level, expected) {
            (ResolutionLevel::Local, None) => true,
            (ResolutionLevel::Local, Some(expected)) => {
                if let Ok(false) = verify_file(path, &expected).await {
                    tracing::warn!(
                        path = %path.display(),
                        "cached file does not match its checksum, using it anyway"
                    );
                    self.emit_warning_with_context(
                        format!("{} does not match its checksum", file.file_name()),
                        "offline, using the cached copy",
                    );
                }
                true
            }
            (ResolutionLevel::Network, None) => false,
            (ResolutionLevel::Network, Some(expected)) => {
                verify_file(path, &expected).await.unwrap_or(false)
            }
        }
    }

    /// Make `file` available at `level`, downloading under the path lock if
    /// the cached copy does not qualify
    ///
    /// # Errors
    ///
    /// Returns `NotCached` at `Local` level when the file is missing, or the
    /// download error at `Network` level.
    pub async fn ensure(&self, file: &ArtifactFile, level: ResolutionLevel) -> Result<PathBuf, Error> {
        let _lock = self.locks.acquire(file.path()).await?;

        if self.is_satisfied(file, level).await {
            self.stats.record_hit();
            file.set_state(DownloadState::Satisfied(level));
            return Ok(file.path().to_path_buf());
        }

        if level == ResolutionLevel::Local {
            file.set_state(DownloadState::Failed(level));
            return Err(CacheError::NotCached {
                path: file.path().display().to_string(),
            }
            .into());
        }

        match self.download(file).await {
            Ok(path) => {
                file.set_state(DownloadState::Satisfied(level));
                Ok(path)
            }
            Err(e) => {
                self.stats.record_failure();
                file.set_state(DownloadState::Failed(level));
                Err(e)
            }
        }
    }

    /// Ensure and read the whole file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be made available or read.
    pub async fn read(&self, file: &ArtifactFile, level: ResolutionLevel) -> Result<Bytes, Error> {
        let path = self.ensure(file, level).await?;
        tokio::fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| Error::io_with_path(&e, &path))
    }

    /// Ensure every file, returning per-file outcomes in input order
    ///
    /// A file that already failed at `level` or above is not attempted again.
    pub async fn ensure_all(
        &self,
        files: &[Arc<ArtifactFile>],
        level: ResolutionLevel,
    ) -> Vec<Result<PathBuf, Error>> {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            if file.failed_at(level) {
                tracing::debug!(path = %file.path().display(), %level, "skipping file that already failed");
                results.push(Err(CacheError::PreviouslyFailed {
                    file: file.file_name().to_string(),
                }
                .into()));
                continue;
            }
            results.push(self.ensure(file, level).await);
        }
        results
    }

    /// Fetch `file` from the first repository that serves it with a valid
    /// checksum. Callers must hold the path lock.
    async fn download(&self, file: &ArtifactFile) -> Result<PathBuf, Error> {
        if self.repositories.is_empty() {
            return Err(CacheError::NoRepositories {
                file: file.file_name().to_string(),
            }
            .into());
        }

        let mut attempts = Vec::new();
        for repository in &self.repositories {
            let url = match repository.artifact_url(file.coordinate(), file.remote_path()) {
                Ok(url) => url,
                Err(e) => {
                    attempts.push(format!("{}: {e}", repository.name()));
                    continue;
                }
            };

            self.emit_download_started(url.as_str(), file.file_name());
            let data = match self.fetcher.fetch(&url).await {
                Ok(Some(data)) => data,
                Ok(None) => {
                    tracing::debug!(%url, "not found");
                    attempts.push(format!("{}: not found", repository.name()));
                    continue;
                }
                Err(e) => {
                    tracing::debug!(%url, error = %e, "fetch failed");
                    self.emit_download_failed(url.as_str(), file.file_name(), &e);
                    attempts.push(format!("{}: {e}", repository.name()));
                    continue;
                }
            };

            let expected = match file.expected_checksum() {
                Some(checksum) => Some(checksum.clone()),
                None => self.remote_sidecar(repository, file).await,
            };

            let checksum = if let Some(expected) = expected {
                let actual = Checksum::from_data(expected.algorithm(), &data);
                if actual != expected {
                    tracing::warn!(%url, expected = %expected, actual = %actual, "checksum mismatch");
                    self.emit(AppEvent::Download(DownloadEvent::ChecksumMismatch {
                        url: url.to_string(),
                        expected: expected.to_hex(),
                        actual: actual.to_hex(),
                    }));
                    attempts.push(format!(
                        "{}: checksum mismatch (expected {expected}, got {actual})",
                        repository.name()
                    ));
                    continue;
                }
                expected
            } else {
                tracing::warn!(%url, "no published checksum, computing locally");
                self.emit(AppEvent::Download(DownloadEvent::ChecksumComputed {
                    file: file.file_name().to_string(),
                    algorithm: self.algorithm.to_string(),
                }));
                Checksum::from_data(self.algorithm, &data)
            };

            let size = data.len() as u64;
            write_atomically(file.path(), data, &checksum).await?;
            self.stats.record_download(size);
            self.emit_download_completed(url.as_str(), file.file_name(), size);
            tracing::debug!(%url, path = %file.path().display(), size, "downloaded");
            return Ok(file.path().to_path_buf());
        }

        Err(CacheError::AllRepositoriesFailed {
            file: file.file_name().to_string(),
            attempts: attempts.join("; "),
        }
        .into())
    }

    /// Sidecar algorithms in lookup order: the configured one first
    fn sidecar_algorithms(&self) -> impl Iterator<Item = ChecksumAlgorithm> + '_ {
        std::iter::once(self.algorithm).chain(
            [
                ChecksumAlgorithm::Sha512,
                ChecksumAlgorithm::Sha256,
                ChecksumAlgorithm::Sha1,
            ]
            .into_iter()
            .filter(move |algorithm| *algorithm != self.algorithm),
        )
    }

    async fn local_sidecar(&self, path: &Path) -> Option<Checksum> {
        for algorithm in self.sidecar_algorithms() {
            let sidecar = sidecar_path(path, algorithm);
            let Ok(contents) = tokio::fs::read_to_string(&sidecar).await else {
                continue;
            };
            match Checksum::parse_sidecar(algorithm, &contents) {
                Ok(checksum) => return Some(checksum),
                Err(e) => {
                    tracing::warn!(path = %sidecar.display(), error = %e, "ignoring unreadable checksum file");
                    self.emit_warning_with_context(
                        format!("ignoring unreadable checksum file {}", sidecar.display()),
                        e.to_string(),
                    );
                }
            }
        }
        None
    }

    async fn remote_sidecar(&self, repository: &Repository, file: &ArtifactFile) -> Option<Checksum> {
        for algorithm in self.sidecar_algorithms() {
            let remote = format!("{}.{}", file.remote_path(), algorithm.extension());
            let Ok(url) = repository.artifact_url(file.coordinate(), &remote) else {
                continue;
            };
            match self.fetcher.fetch(&url).await {
                Ok(Some(body)) => match Checksum::parse_sidecar(algorithm, &String::from_utf8_lossy(&body)) {
                    Ok(checksum) => return Some(checksum),
                    Err(e) => tracing::warn!(%url, error = %e, "ignoring unreadable checksum file"),
                },
                Ok(None) => {}
                Err(e) => tracing::debug!(%url, error = %e, "checksum fetch failed"),
            }
        }
        None
    }
}

fn checked_segment<'a>(kind: &str, value: &'a str) -> Result<&'a str, Error> {
    let mut components = Path::new(value).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if single && !value.contains(['/', '\\']) {
        Ok(value)
    } else {
        Err(CacheError::UnsafePath {
            kind: kind.to_string(),
            value: value.to_string(),
        }
        .into())
    }
}

/// Checksum sidecar of `path` for `algorithm`
#[must_use]
pub fn sidecar_path(path: &Path, algorithm: ChecksumAlgorithm) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(algorithm.extension());
    PathBuf::from(name)
}

/// Write data, then its sidecar, each through a temp file in the target
/// directory so readers never observe a partial file
async fn write_atomically(path: &Path, data: Bytes, checksum: &Checksum) -> Result<(), Error> {
    let target = path.to_path_buf();
    let algorithm = checksum.algorithm();
    let hex = checksum.to_hex();

    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let dir = target
            .parent()
            .ok_or_else(|| std::io::Error::other("cache path has no parent directory"))?;
        std::fs::create_dir_all(dir)?;
        persist_via_temp(dir, &target, &data)?;
        persist_via_temp(dir, &sidecar_path(&target, algorithm), hex.as_bytes())?;

        for stale in [
            ChecksumAlgorithm::Sha256,
            ChecksumAlgorithm::Sha512,
            ChecksumAlgorithm::Sha1,
        ] {
            if stale != algorithm {
                let _ = std::fs::remove_file(sidecar_path(&target, stale));
            }
        }
        Ok(())
    })
    .await
    .map_err(|e| Error::internal(format!("cache write task failed: {e}")))?
    .map_err(|e| {
        Error::from(CacheError::WriteFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    })
}

fn persist_via_temp(dir: &Path, target: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("/c/g/m/1/m-1.jar"), ChecksumAlgorithm::Sha256),
            PathBuf::from("/c/g/m/1/m-1.jar.sha256")
        );
    }

    #[test]
    fn test_checked_segment() {
        for ok in ["org.example", "lib-1.0.jar", "1.0-SNAPSHOT", "..hidden"] {
            assert_eq!(checked_segment("file name", ok).unwrap(), ok);
        }
        for bad in ["", ".", "..", "../x.jar", "a/b", "a\\b", "/etc/passwd", "lib/"] {
            assert!(
                matches!(
                    checked_segment("file name", bad),
                    Err(Error::Cache(CacheError::UnsafePath { .. }))
                ),
                "{bad:?} accepted"
            );
        }
    }
}
