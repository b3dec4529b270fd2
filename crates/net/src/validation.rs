//! URL and response validation

use graft_errors::{Error, NetworkError};
use url::Url;

/// Schemes the HTTP fetcher knows how to serve
pub(crate) fn validate_scheme(url: &Url) -> Result<(), Error> {
    match url.scheme() {
        "http" | "https" | "file" => Ok(()),
        scheme => Err(NetworkError::UnsupportedProtocol {
            protocol: scheme.to_string(),
        }
        .into()),
    }
}

/// Whether a status means the file does not exist in this repository
pub(crate) fn is_absent(status: reqwest::StatusCode) -> bool {
    matches!(
        status,
        reqwest::StatusCode::NOT_FOUND | reqwest::StatusCode::GONE
    )
}

/// Turn a non-success, non-absent status into an error
pub(crate) fn validate_response(response: &reqwest::Response) -> Result<(), Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(NetworkError::HttpError {
        status: status.as_u16(),
        message: status.to_string(),
    }
    .into())
}
