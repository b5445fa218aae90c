//! Unified error type for the anistream catalog.
//!
//! The store and catalog layers funnel their failures into [`Error`], which
//! carries enough context for API handlers to derive an HTTP status code via
//! [`Error::http_status`].

use std::fmt;

/// Common error type for anistream.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "anime", "episode").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A conflicting record already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A collection document could not be encoded or decoded.
    #[error("Storage error [{collection}]: {message}")]
    Storage {
        /// The collection key involved.
        collection: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Conflict(_) => 409,
            Error::Storage { .. } => 500,
            Error::Io(_) => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::Validation(_) => "validation_error",
            Error::Conflict(_) => "conflict",
            Error::Storage { .. } => "storage_error",
            Error::Io(_) => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Create a new NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Create a new Validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a new Conflict error.
    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        Error::Conflict(msg.into())
    }

    /// Create a new Storage error for the given collection.
    pub fn storage(collection: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::Storage {
            collection: collection.into(),
            message: message.to_string(),
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
