//! Error types for geometry derivation.

use thiserror::Error;

use magnetgeo_ir::IrError;

/// Errors raised while resolving records or deriving geometry metadata.
#[derive(Error, Debug)]
pub enum GeoError {
    /// A record could not be encoded or decoded.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// Reading or writing a record failed.
    #[error("failed to {op} {name}: {source}")]
    Io {
        /// Record or file name.
        name: String,
        /// Operation that failed (`load`, `dump`).
        op: &'static str,
        /// Underlying error.
        source: std::io::Error,
    },

    /// No record is stored under this name.
    #[error("no record named {0}")]
    NotFound(String),

    /// A composite references a child that cannot be resolved.
    #[error("cannot resolve {name} referenced by {parent}: {source}")]
    MissingReference {
        /// Referenced record name.
        name: String,
        /// Composite holding the reference.
        parent: String,
        /// Why resolution failed.
        source: Box<GeoError>,
    },

    /// A reference resolved to a record of the wrong kind.
    #[error("{name} is a {found}, expected {expected}")]
    UnexpectedKind {
        /// Record name.
        name: String,
        /// Expected kind.
        expected: &'static str,
        /// Kind found.
        found: &'static str,
    },

    /// The record describes no placeable part (profile, cut model, ...).
    #[error("{name} ({kind}) is not a magnet part")]
    NotAPart {
        /// Record name.
        name: String,
        /// Record kind.
        kind: &'static str,
    },

    /// A composite with no children has no bounding box.
    #[error("{0} has no children")]
    EmptyComposite(String),

    /// An HTS stack configuration is malformed.
    #[error("invalid HTS configuration {name}: {reason}")]
    InvalidConfig {
        /// Configuration name.
        name: String,
        /// What is wrong.
        reason: String,
    },
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeoError>;
