//! Resolution engine error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ResolveError {
    #[error("invalid coordinate '{input}': expected group:module:version")]
    InvalidCoordinate { input: String },

    #[error("cannot rebind {expected} to {actual}: group and module must match")]
    RebindMismatch { expected: String, actual: String },

    #[error("resolution failed for {coordinate}: {message}")]
    Failed { coordinate: String, message: String },
}
