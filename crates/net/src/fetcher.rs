//! Whole-file fetch abstraction

use async_trait::async_trait;
use bytes::Bytes;
use graft_errors::{Error, NetworkError};
use url::Url;

use crate::client::NetClient;
use crate::validation::validate_scheme;

/// Fetches a single URL into memory
///
/// `Ok(None)` means the repository does not have the file; errors are
/// reserved for failures that say nothing about existence.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Option<Bytes>, Error>;
}

/// Fetcher for `http(s)://` and `file://` repositories
#[derive(Clone)]
pub struct HttpFetcher {
    client: NetClient,
}

impl HttpFetcher {
    #[must_use]
    pub fn new(client: NetClient) -> Self {
        Self { client }
    }

    async fn fetch_file(url: &Url) -> Result<Option<Bytes>, Error> {
        let path = url
            .to_file_path()
            .map_err(|()| NetworkError::InvalidUrl(url.to_string()))?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io_with_path(&e, &path)),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Option<Bytes>, Error> {
        validate_scheme(url)?;
        if url.scheme() == "file" {
            return Self::fetch_file(url).await;
        }
        self.client.get_optional(url.as_str()).await
    }
}
