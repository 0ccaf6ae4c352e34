//! Error types for XAO parsing and group reconciliation.

use std::path::PathBuf;

use thiserror::Error;

use magnetgeo::GeoError;

/// Errors from reading XAO files and building physical groups.
#[derive(Error, Debug)]
pub enum XaoError {
    /// The XML is malformed.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// A required attribute is missing.
    #[error("missing attribute `{attribute}` on <{element}>")]
    MissingAttribute {
        /// Attribute name.
        attribute: &'static str,
        /// Element name.
        element: String,
    },

    /// An attribute has an unusable value.
    #[error("invalid {attribute}=\"{value}\" on <{element}>")]
    InvalidAttribute {
        /// Attribute name.
        attribute: &'static str,
        /// Element name.
        element: String,
        /// Offending value.
        value: String,
    },

    /// The XAO file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The geometry and the layout disagree on the number of solids.
    #[error("wrong number of {dimension}s: {expected} named, {found} in geometry")]
    CountMismatch {
        /// Names derived from the records.
        expected: usize,
        /// Entities in the geometry.
        found: usize,
        /// Entity dimension compared.
        dimension: &'static str,
    },

    /// User mesh sizes do not match the magnets.
    #[error("wrong number of mesh sizes: expected {expected}, got {found}")]
    MeshSizeCount {
        /// Regions to size.
        expected: usize,
        /// Sizes given.
        found: usize,
    },

    /// Isolants cannot be hidden once air surrounds them.
    #[error("isolants cannot be hidden in a geometry with an air region")]
    AirWithHiddenIsolants,

    /// Groups could not be rendered as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A name pattern failed to compile.
    #[error(transparent)]
    Pattern(#[from] regex::Error),

    /// Deriving the layout failed.
    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// Result type for XAO operations.
pub type Result<T> = std::result::Result<T, XaoError>;
