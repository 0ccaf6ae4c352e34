//! Error types for record encoding and decoding.

use thiserror::Error;

/// Errors raised while encoding or decoding records.
#[derive(Error, Debug)]
pub enum IrError {
    /// The type tag names no registered record type.
    #[error("unknown record type: {0}")]
    UnknownType(String),

    /// The document carries no type tag.
    #[error("record has no `__classname__` tag")]
    MissingTag,

    /// A child collection has an unsupported shape.
    #[error("unsupported shape of {field} ({found})")]
    UnsupportedShape {
        /// Offending field.
        field: &'static str,
        /// Kind of value found instead.
        found: String,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML text could not be parsed.
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML text could not be written.
    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Result type for record operations.
pub type Result<T> = std::result::Result<T, IrError>;
