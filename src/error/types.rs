//! Error types
//!
//! Defines domain-specific error types for path resolution, storage
//! operations, the web shell and server startup.

use std::io;

use axum::extract::multipart::MultipartError;
use thiserror::Error;

/// A user-supplied path that would land outside the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Path escapes storage root: {path}")]
pub struct PathEscapeError {
    path: String,
}

impl PathEscapeError {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// The offending input, as the caller supplied it
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Storage module errors
///
/// Expected absences (deleting what is gone, creating what exists) are not
/// errors; only a missing target that an operation requires is `NotFound`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    PathEscape(#[from] PathEscapeError),

    #[error("Not found: /{0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Maps an I/O error to `NotFound` when the target is missing, `Io` otherwise.
    pub fn from_io(error: io::Error, relative_path: &str) -> Self {
        if error.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(relative_path.to_string())
        } else {
            StorageError::Io(error)
        }
    }
}

/// Errors raised while serving an HTTP request
#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid multipart data: {0}")]
    Multipart(#[from] MultipartError),
}

impl From<PathEscapeError> for WebError {
    fn from(error: PathEscapeError) -> Self {
        WebError::Storage(StorageError::PathEscape(error))
    }
}

/// Errors that stop the server from starting or running
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
