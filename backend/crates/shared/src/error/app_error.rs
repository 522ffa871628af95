//! Application Error
//!
//! Every crate error (`ContentError`, `AuthError`, `ClientError`) converts
//! into [`AppError`] before it becomes an HTTP response.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use serde::Serialize;

use super::kind::ErrorKind;

/// Unified error: a kind, a user-facing message, an optional hint on what
/// to do next and the underlying cause (kept out of responses)
///
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::internal("Failed to save post").with_action("Please try again");
/// assert_eq!(err.kind(), ErrorKind::InternalServerError);
/// assert_eq!(err.action(), Some("Please try again"));
/// ```
pub struct AppError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    action: Option<Cow<'static, str>>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

pub type AppResult<T> = Result<T, AppError>;

/// RFC 7807 problem document
#[derive(Debug, Serialize)]
pub struct Problem<'a> {
    #[serde(rename = "type")]
    pub type_uri: String,
    pub title: &'static str,
    pub status: u16,
    pub detail: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'a str>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            action: None,
            source: None,
        }
    }

    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InternalServerError, message)
    }

    pub fn service_unavailable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    pub fn with_action(mut self, action: impl Into<Cow<'static, str>>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn problem(&self) -> Problem<'_> {
        Problem {
            type_uri: format!("https://httpstatuses.io/{}", self.status_code()),
            title: self.kind.as_str(),
            status: self.status_code(),
            detail: &self.message,
            action: self.action(),
        }
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("action", &self.action)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(action) = &self.action {
            write!(f, " ({action})")?;
        }
        Ok(())
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_document() {
        let err = AppError::not_found("Post not found");
        let json = serde_json::to_value(err.problem()).unwrap();

        assert_eq!(json["type"], "https://httpstatuses.io/404");
        assert_eq!(json["title"], "Not Found");
        assert_eq!(json["status"], 404);
        assert_eq!(json["detail"], "Post not found");
        assert!(json.get("action").is_none());
        assert!(err.is_not_found());
    }

    #[test]
    fn test_action_and_display() {
        let err = AppError::internal("Failed to delete category").with_action("Please try again");
        assert_eq!(
            err.to_string(),
            "[Internal Server Error] Failed to delete category (Please try again)"
        );
        assert_eq!(
            serde_json::to_value(err.problem()).unwrap()["action"],
            "Please try again"
        );
    }

    #[test]
    fn test_source_is_kept() {
        let io = std::io::Error::other("disk full");
        let err = AppError::service_unavailable("Image storage unavailable").with_source(io);
        assert!(err.source().is_some());
        assert_eq!(err.status_code(), 503);
    }
}
