//! Error types for academiccv.
//!
//! Library crates use [`CvError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all academiccv operations.
#[derive(Debug, thiserror::Error)]
pub enum CvError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to the author-lookup API.
    #[error("network error: {0}")]
    Network(String),

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (invalid format, unknown collection, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A stored document could not be turned into a typed record.
    #[error("invalid {collection} record {id}: {message}")]
    Record {
        collection: String,
        id: String,
        message: String,
    },

    /// The metadata collection must hold exactly one document.
    #[error("expected exactly one metadata record, found {found}")]
    MetadataCount { found: usize },

    /// The external typesetter failed.
    #[error("typesetting failed: {message}")]
    Typeset { message: String },

    /// JSON (de)serialization error outside of record parsing.
    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CvError>;

impl CvError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a record error for a document in a named collection.
    pub fn record(
        collection: impl Into<String>,
        id: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Record {
            collection: collection.into(),
            id: id.into(),
            message: msg.into(),
        }
    }

    /// Create a typesetting error from any displayable message.
    pub fn typeset(msg: impl Into<String>) -> Self {
        Self::Typeset {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
