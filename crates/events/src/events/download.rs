use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::FailureContext;

/// Artifact transfer events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    /// Fetch from one repository started
    Started { url: String, file: String },

    /// File written to the cache
    Completed { url: String, file: String, size: u64 },

    /// Fetch from one repository failed; the next repository may still succeed
    Failed {
        url: String,
        file: String,
        failure: FailureContext,
    },

    /// Transient failure, another attempt follows after the delay
    Retrying {
        url: String,
        attempt: usize,
        max_attempts: usize,
        backoff_delay: Duration,
    },

    /// Downloaded bytes did not match the published checksum
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    /// Remote checksum missing, computed locally instead
    ChecksumComputed { file: String, algorithm: String },
}
