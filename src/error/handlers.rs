//! Error handlers
//!
//! Converts errors into HTTP responses and logs them.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{debug, error, warn};

use crate::error::types::{StorageError, WebError};

/// Handle a storage error
pub fn handle_error(err: &StorageError) {
    match err {
        StorageError::PathEscape(e) => warn!("Rejected request: {}", e),
        StorageError::NotFound(p) => debug!("Not found: /{}", p),
        StorageError::Io(e) => error!("Storage I/O failure: {}", e),
    }
}

/// Convert error to HTTP status code
pub fn error_to_status_code(err: &StorageError) -> StatusCode {
    match err {
        StorageError::PathEscape(_) => StatusCode::FORBIDDEN,
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        handle_error(&self);
        let status = error_to_status_code(&self);
        // I/O details stay in the log
        let body = status.canonical_reason().unwrap_or("Error");
        (status, body).into_response()
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::Storage(e) => e.into_response(),
            WebError::Multipart(e) => {
                warn!("Rejected upload: {}", e);
                e.into_response()
            }
        }
    }
}
