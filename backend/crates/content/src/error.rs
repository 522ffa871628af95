//! Content Error Types
//!
//! Content-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. Errors are logged by the application
//! layer (with the failing operation's name), so `IntoResponse` only renders.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::storage::StorageError;
use thiserror::Error;

/// Content-specific result type alias
pub type ContentResult<T> = Result<T, ContentError>;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Post not found")]
    PostNotFound,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Author not found")]
    AuthorNotFound,

    /// Input validation error
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ContentError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContentError::PostNotFound
            | ContentError::CategoryNotFound
            | ContentError::AuthorNotFound => ErrorKind::NotFound,
            ContentError::Validation(_) => ErrorKind::BadRequest,
            ContentError::Storage(e) => match e {
                StorageError::InvalidKey(_) | StorageError::UnsupportedContentType(_) => {
                    ErrorKind::BadRequest
                }
                StorageError::TooLarge { .. } => ErrorKind::PayloadTooLarge,
                StorageError::NotFound(_) => ErrorKind::NotFound,
                StorageError::Disabled => ErrorKind::ServiceUnavailable,
                StorageError::Io(_) => ErrorKind::InternalServerError,
            },
            ContentError::Database(_) | ContentError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError. Server-side details stay in the logs.
    pub fn to_app_error(&self) -> AppError {
        match self.kind() {
            ErrorKind::InternalServerError => {
                AppError::internal("The operation could not be completed")
                    .with_action("Please try again")
            }
            ErrorKind::ServiceUnavailable => {
                AppError::new(self.kind(), self.to_string()).with_action("Please try again later")
            }
            kind => AppError::new(kind, self.to_string()),
        }
    }

    /// Log a failed operation with the appropriate level
    pub fn log(&self, operation: &'static str) {
        match self {
            ContentError::Database(e) => {
                tracing::error!(operation, error = %e, "Content database error");
            }
            ContentError::Internal(msg) => {
                tracing::error!(operation, message = %msg, "Content internal error");
            }
            ContentError::Storage(StorageError::Io(e)) => {
                tracing::error!(operation, error = %e, "Object storage I/O error");
            }
            _ => {
                tracing::warn!(operation, error = %self, "Content operation rejected");
            }
        }
    }
}

impl From<AppError> for ContentError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => ContentError::Validation(err.message().to_string()),
            _ => ContentError::Internal(err.message().to_string()),
        }
    }
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for ContentError {
    fn into_response(self) -> Response {
        self.to_app_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ContentError::PostNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ContentError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ContentError::Storage(StorageError::Disabled).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let app = ContentError::Internal("pool exhausted".into()).to_app_error();
        assert!(!app.message().contains("pool"));
        assert_eq!(app.action(), Some("Please try again"));
    }
}
