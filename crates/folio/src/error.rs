//! Error types for folio.
//!
//! Every failure in the substrate is fatal for the operation that raised it:
//! nothing here is retried, and each variant carries the object number, key
//! or path needed to diagnose it.

use std::path::PathBuf;

use thiserror::Error;

use crate::objects::{Kind, NodeId, Reference};

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error raised by an external collaborator (parser, codec).
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    /// The registry has no in-use entry for the referenced object number.
    #[error("dangling reference {0}")]
    DanglingReference(Reference),

    /// A compressed entry points at a container that is not an object stream.
    #[error("object {number} is stored in {container}, which is not an object stream")]
    CorruptContainer { number: u32, container: u32 },

    /// Resolved data is not of the statically expected kind.
    #[error("type mismatch while resolving {context}: expected {expected}, found {found}")]
    TypeMismatch {
        expected: Kind,
        found: Kind,
        context: String,
    },

    /// The backing document is structurally corrupt.
    #[error("structural corruption: {0}")]
    StructuralCorruption(String),

    /// Deliberately unimplemented facade method.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Mutation of an object whose generation is no longer reusable.
    #[error("object {0} has an unreusable generation and cannot be modified")]
    UnreusableSlot(u32),

    /// Reading or writing an externally stored stream body failed.
    #[error("external stream resource {path:?}: {source}")]
    ExternalResource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The object source failed to materialize an object.
    #[error("failed to load object {number}: {source}")]
    Source {
        number: u32,
        #[source]
        source: SourceError,
    },

    /// A stream filter failed, or is not registered.
    #[error("stream filter {filter}: {message}")]
    Filter { filter: String, message: String },

    /// Positional access past the end of an array.
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Arena handle that does not address a live node.
    #[error("invalid node handle {0:?}")]
    InvalidNode(NodeId),

    /// Writing serialized output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a type mismatch error
    pub fn type_mismatch(expected: Kind, found: Kind, context: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected,
            found,
            context: context.into(),
        }
    }

    /// Create a structural corruption error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::StructuralCorruption(msg.into())
    }

    /// Create a filter error
    pub fn filter(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Filter {
            filter: filter.into(),
            message: message.into(),
        }
    }
}
