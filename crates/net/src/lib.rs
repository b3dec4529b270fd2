#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for graft
//!
//! Everything the cache needs from the outside world goes through the
//! [`Fetcher`] trait: one URL in, the whole body (or "not there") out.
//! [`HttpFetcher`] serves `http(s)://` through a pooled client with retry
//! logic and `file://` straight from disk.

mod client;
mod fetcher;
#[cfg(feature = "test-util")]
mod memory;
mod repository;
mod retry;
mod validation;

pub use client::{NetClient, NetConfig};
pub use fetcher::{Fetcher, HttpFetcher};
#[cfg(feature = "test-util")]
pub use memory::MemoryFetcher;
pub use repository::Repository;
pub use retry::RetryConfig;

use graft_errors::{Error, NetworkError};
use url::Url;

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed or invalid according to RFC 3986.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
}
