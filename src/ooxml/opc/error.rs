/// Error types for OPC package operations
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpcError {
    #[error("Invalid pack URI: {0}")]
    InvalidPackUri(String),

    #[error("Part not found: {0}")]
    PartNotFound(String),

    #[error("Relationship not found: {0}")]
    RelationshipNotFound(String),

    #[error("Content type not found for partname: {0}")]
    ContentTypeNotFound(String),

    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    /// Two parts claimed the same partname. Partname allocation never produces this,
    /// so seeing it means a caller bypassed allocation or the package is corrupt.
    #[error("Duplicate partname: {0}")]
    DuplicatePartName(String),

    /// An internal relationship points at a part that is not in the package.
    #[error("Unresolved relationship {r_id} from {source_part}: no part at {target}")]
    UnresolvedRelationship {
        source_part: String,
        r_id: String,
        target: String,
    },

    /// Every id in the scope has been issued or reserved.
    #[error("No ids left in scope: {0}")]
    IdSpaceExhausted(String),

    #[error("Package is read-only")]
    PackageNotWritable,

    #[error("XML parsing error: {0}")]
    XmlError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Quick-XML error: {0}")]
    QuickXmlError(#[from] quick_xml::Error),

    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    #[error("Attribute error: {0}")]
    AttrError(String),
}

impl From<quick_xml::events::attributes::AttrError> for OpcError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        OpcError::AttrError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OpcError>;
