//! Descriptor and module metadata parse errors

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum MetadataError {
    #[error("malformed descriptor: {message}")]
    MalformedDescriptor { message: String },

    #[error("descriptor has no <{element}> element")]
    MissingElement { element: String },

    #[error("malformed module metadata: {message}")]
    MalformedModule { message: String },

    #[error("unsupported module metadata format version {version}")]
    UnsupportedFormat { version: String },
}

impl From<roxmltree::Error> for MetadataError {
    fn from(err: roxmltree::Error) -> Self {
        Self::MalformedDescriptor {
            message: err.to_string(),
        }
    }
}
