//! One cached artifact file

use graft_hash::Checksum;
use graft_types::{Coordinate, ResolutionLevel};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Outcome of the last attempt to make a file available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Pending,
    Satisfied(ResolutionLevel),
    Failed(ResolutionLevel),
}

/// A file belonging to one coordinate, with its cache location and the
/// checksum it is expected to have
#[derive(Debug)]
pub struct ArtifactFile {
    coordinate: Coordinate,
    file_name: String,
    remote_path: String,
    path: PathBuf,
    expected: Option<Checksum>,
    state: Mutex<DownloadState>,
}

impl ArtifactFile {
    pub(crate) fn new(
        coordinate: Coordinate,
        file_name: String,
        remote_path: String,
        path: PathBuf,
        expected: Option<Checksum>,
    ) -> Self {
        Self {
            coordinate,
            file_name,
            remote_path,
            path,
            expected,
            state: Mutex::new(DownloadState::Pending),
        }
    }

    #[must_use]
    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Location relative to the coordinate's repository directory
    #[must_use]
    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    /// Target path in the local cache
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checksum published alongside the file's metadata, if any
    #[must_use]
    pub fn expected_checksum(&self) -> Option<&Checksum> {
        self.expected.as_ref()
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        self.file_name.rsplit_once('.').map_or("", |(_, ext)| ext)
    }

    #[must_use]
    pub fn state(&self) -> DownloadState {
        *self.state.lock()
    }

    /// Whether an earlier attempt at `level` (or above) already failed
    #[must_use]
    pub fn failed_at(&self, level: ResolutionLevel) -> bool {
        matches!(self.state(), DownloadState::Failed(failed) if failed >= level)
    }

    pub(crate) fn set_state(&self, state: DownloadState) {
        *self.state.lock() = state;
    }
}
