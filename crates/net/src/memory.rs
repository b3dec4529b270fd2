//! In-memory repository for tests

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use graft_errors::{Error, NetworkError};
use graft_types::Coordinate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

use crate::fetcher::Fetcher;
use crate::repository::Repository;

enum Entry {
    Data(Bytes),
    Failure(u16),
}

/// Serves files from a map and counts every request
pub struct MemoryFetcher {
    entries: DashMap<String, Entry>,
    requests: DashMap<String, usize>,
    total: AtomicUsize,
    latency: Option<Duration>,
}

impl Default for MemoryFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFetcher {
    /// Base URL of the served repository
    pub const BASE_URL: &'static str = "memory://repo/";

    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            requests: DashMap::new(),
            total: AtomicUsize::new(0),
            latency: None,
        }
    }

    /// Delay every response, to widen race windows
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// The repository this fetcher answers for
    ///
    /// # Errors
    ///
    /// Never fails in practice; the base URL is a constant.
    pub fn repository(&self) -> Result<Repository, Error> {
        Repository::new("memory", Self::BASE_URL)
    }

    /// URL of an artifact file in the served repository
    #[must_use]
    pub fn url(&self, coordinate: &Coordinate, file_name: &str) -> String {
        format!(
            "{}{}/{file_name}",
            Self::BASE_URL,
            coordinate.repository_path()
        )
    }

    /// Serve `data` at an artifact path
    pub fn insert(&self, coordinate: &Coordinate, file_name: &str, data: impl Into<Bytes>) {
        self.insert_url(self.url(coordinate, file_name), data);
    }

    /// Serve `data` at an exact URL
    pub fn insert_url(&self, url: impl Into<String>, data: impl Into<Bytes>) {
        self.entries.insert(url.into(), Entry::Data(data.into()));
    }

    /// Answer an artifact path with an HTTP error status
    pub fn insert_failure(&self, coordinate: &Coordinate, file_name: &str, status: u16) {
        self.entries
            .insert(self.url(coordinate, file_name), Entry::Failure(status));
    }

    /// Remove a served file
    pub fn remove(&self, coordinate: &Coordinate, file_name: &str) {
        self.entries.remove(&self.url(coordinate, file_name));
    }

    /// Requests made for one artifact path
    #[must_use]
    pub fn requests_for(&self, coordinate: &Coordinate, file_name: &str) -> usize {
        self.requests_for_url(&self.url(coordinate, file_name))
    }

    /// Requests made for an exact URL
    #[must_use]
    pub fn requests_for_url(&self, url: &str) -> usize {
        self.requests.get(url).map_or(0, |count| *count)
    }

    /// Requests made in total
    #[must_use]
    pub fn total_requests(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, url: &Url) -> Result<Option<Bytes>, Error> {
        *self.requests.entry(url.to_string()).or_insert(0) += 1;
        self.total.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.entries.get(url.as_str()).as_deref() {
            Some(Entry::Data(data)) => Ok(Some(data.clone())),
            Some(Entry::Failure(status)) => Err(NetworkError::HttpError {
                status: *status,
                message: "injected failure".to_string(),
            }
            .into()),
            None => Ok(None),
        }
    }
}
