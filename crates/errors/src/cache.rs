//! Artifact cache error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum CacheError {
    #[error("not in local cache: {path}")]
    NotCached { path: String },

    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("invalid checksum file {path}: {message}")]
    InvalidChecksum { path: String, message: String },

    #[error("failed to download {file} from any repository: {attempts}")]
    AllRepositoriesFailed { file: String, attempts: String },

    #[error("no repositories configured for {file}")]
    NoRepositories { file: String },

    #[error("failed to lock {path}: {message}")]
    LockFailed { path: String, message: String },

    #[error("failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("{file} already failed to download at this level")]
    PreviouslyFailed { file: String },

    #[error("{kind} {value:?} would leave its cache directory")]
    UnsafePath { kind: String, value: String },
}

impl UserFacingError for CacheError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotCached { .. } => Some("Run again without --offline to download it."),
            Self::ChecksumMismatch { .. } => {
                Some("The repository served corrupted data; retry or use another mirror.")
            }
            Self::NoRepositories { .. } => Some("Add at least one [[repositories]] entry."),
            Self::UnsafePath { .. } => {
                Some("The repository published metadata with an invalid name; report it upstream.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AllRepositoriesFailed { .. } | Self::ChecksumMismatch { .. } | Self::LockFailed { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NotCached { .. } => "cache.not_cached",
            Self::ChecksumMismatch { .. } => "cache.checksum_mismatch",
            Self::InvalidChecksum { .. } => "cache.invalid_checksum",
            Self::AllRepositoriesFailed { .. } => "cache.all_repositories_failed",
            Self::NoRepositories { .. } => "cache.no_repositories",
            Self::LockFailed { .. } => "cache.lock_failed",
            Self::WriteFailed { .. } => "cache.write_failed",
            Self::PreviouslyFailed { .. } => "cache.previously_failed",
            Self::UnsafePath { .. } => "cache.unsafe_path",
        })
    }
}
