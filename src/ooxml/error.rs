/// Error types for OOXML operations.
use thiserror::Error;

use crate::ooxml::opc::error::OpcError;

/// Result type for OOXML operations.
pub type Result<T> = std::result::Result<T, OoxmlError>;

/// Error types for OOXML operations.
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// OPC package error
    #[error("OPC error: {0}")]
    Opc(#[from] OpcError),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// Indexed access outside `[-len, len - 1]`
    #[error("Index {index} out of range for collection of {len}")]
    OutOfRange { index: isize, len: usize },

    /// Image bytes do not start with a recognized header
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An attribute string failed to decode to its declared type
    #[error("Invalid value {value:?} for attribute '{attr}': {reason}")]
    InvalidAttributeValue {
        attr: String,
        value: String,
        reason: String,
    },

    /// Part not found
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// Invalid content type
    #[error("Invalid content type: expected {expected}, got {got}")]
    InvalidContentType { expected: String, got: String },

    /// Invalid format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OoxmlError {
    pub(crate) fn invalid_attr(
        attr: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        OoxmlError::InvalidAttributeValue {
            attr: attr.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl From<quick_xml::Error> for OoxmlError {
    fn from(err: quick_xml::Error) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}
