//! Common error types for the learning portal store

use thiserror::Error;

/// Common result type for portal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the store, the CLI and the generation seam
#[derive(Error, Debug)]
pub enum Error {
    /// An identifier path did not resolve (stale or deleted node).
    ///
    /// Mutation callers treat this as a no-op: the input collection is
    /// returned to them unchanged.
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// A structural replacement or creation request failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The generation collaborator failed, timed out or returned a bad payload
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Operation not allowed in the current selection state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Credential check rejected a login request
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Interchange text could not be produced or parsed
    #[error("Interchange error: {0}")]
    Interchange(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a `PathNotFound` from any displayable path description
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Error::PathNotFound(what.to_string())
    }

    /// True when the error only signals a stale identifier path
    pub fn is_path_not_found(&self) -> bool {
        matches!(self, Error::PathNotFound(_))
    }
}
