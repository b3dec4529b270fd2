#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Artifact checksums for graft
//!
//! Repositories publish a digest next to every file (`foo.jar.sha1`,
//! `foo.jar.sha256`, ...). This crate computes those digests, parses the
//! sidecar files and compares the two.

use graft_errors::{CacheError, Error};
use graft_types::ChecksumAlgorithm;
use sha2::Digest;
use std::fmt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Size of chunks for streaming hash computation
const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// A digest together with the algorithm that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    algorithm: ChecksumAlgorithm,
    bytes: Vec<u8>,
}

impl Checksum {
    #[must_use]
    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Get the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Convert to lowercase hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Parse from hex string
    ///
    /// # Errors
    /// Returns an error if the input is not valid hexadecimal or its length
    /// does not match the algorithm's digest size.
    pub fn from_hex(algorithm: ChecksumAlgorithm, s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s.trim()).map_err(|e| CacheError::InvalidChecksum {
            path: String::new(),
            message: format!("invalid hex: {e}"),
        })?;

        if bytes.len() != algorithm.digest_len() {
            return Err(CacheError::InvalidChecksum {
                path: String::new(),
                message: format!(
                    "{algorithm} digest must be {} bytes, got {}",
                    algorithm.digest_len(),
                    bytes.len()
                ),
            }
            .into());
        }

        Ok(Self { algorithm, bytes })
    }

    /// Parse the contents of a checksum sidecar file
    ///
    /// Accepts the bare digest as well as the `digest  filename` layout
    /// written by `sha256sum` and some repository managers.
    ///
    /// # Errors
    /// Returns an error if the first token is not a valid digest.
    pub fn parse_sidecar(algorithm: ChecksumAlgorithm, contents: &str) -> Result<Self, Error> {
        let token = contents.split_whitespace().next().unwrap_or_default();
        Self::from_hex(algorithm, &token.to_ascii_lowercase())
    }

    /// Compute the digest of a byte slice
    #[must_use]
    pub fn from_data(algorithm: ChecksumAlgorithm, data: &[u8]) -> Self {
        let mut hasher = StreamHasher::new(algorithm);
        hasher.update(data);
        hasher.finalize()
    }

    /// Compute the digest of a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub async fn hash_file(algorithm: ChecksumAlgorithm, path: &Path) -> Result<Self, Error> {
        let mut file = File::open(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;

        let mut hasher = StreamHasher::new(algorithm);
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = file
                .read(&mut buffer)
                .await
                .map_err(|e| Error::io_with_path(&e, path))?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(hasher.finalize())
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Incremental hasher over the supported algorithms
pub enum StreamHasher {
    Sha256(sha2::Sha256),
    Sha512(sha2::Sha512),
    Sha1(sha1::Sha1),
}

impl StreamHasher {
    #[must_use]
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            ChecksumAlgorithm::Sha512 => Self::Sha512(sha2::Sha512::new()),
            ChecksumAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::new()),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(hasher) => hasher.update(data),
            Self::Sha512(hasher) => hasher.update(data),
            Self::Sha1(hasher) => hasher.update(data),
        }
    }

    #[must_use]
    pub fn finalize(self) -> Checksum {
        let (algorithm, bytes) = match self {
            Self::Sha256(hasher) => (ChecksumAlgorithm::Sha256, hasher.finalize().to_vec()),
            Self::Sha512(hasher) => (ChecksumAlgorithm::Sha512, hasher.finalize().to_vec()),
            Self::Sha1(hasher) => (ChecksumAlgorithm::Sha1, hasher.finalize().to_vec()),
        };
        Checksum { algorithm, bytes }
    }
}

/// Verify a file matches an expected checksum
///
/// # Errors
/// Returns an error if the file cannot be read or hashed.
pub async fn verify_file(path: &Path, expected: &Checksum) -> Result<bool, Error> {
    let actual = Checksum::hash_file(expected.algorithm(), path).await?;
    Ok(actual == *expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_known_digests() {
        let sha256 = Checksum::from_data(ChecksumAlgorithm::Sha256, b"hello world");
        assert_eq!(
            sha256.to_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );

        let sha1 = Checksum::from_data(ChecksumAlgorithm::Sha1, b"hello world");
        assert_eq!(sha1.to_hex(), "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");

        let sha512 = Checksum::from_data(ChecksumAlgorithm::Sha512, b"hello world");
        assert_eq!(sha512.as_bytes().len(), 64);
    }

    #[test]
    fn test_parse_sidecar_layouts() {
        let bare = Checksum::parse_sidecar(
            ChecksumAlgorithm::Sha1,
            "2AAE6C35C94FCFB415DBE95F408B9CE91EE846ED\n",
        )
        .unwrap();
        let with_name = Checksum::parse_sidecar(
            ChecksumAlgorithm::Sha1,
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed  hello.txt",
        )
        .unwrap();
        assert_eq!(bare, with_name);
        assert!(Checksum::parse_sidecar(ChecksumAlgorithm::Sha1, "").is_err());
    }

    #[tokio::test]
    async fn test_hash_file() {
        use std::io::Write;
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"hello world").unwrap();

        let hash = Checksum::hash_file(ChecksumAlgorithm::Sha256, temp.path())
            .await
            .unwrap();
        assert_eq!(hash, Checksum::from_data(ChecksumAlgorithm::Sha256, b"hello world"));
    }
}
