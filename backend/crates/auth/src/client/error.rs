//! Client Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure (connect, timeout, body decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error status
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Backend service is not configured")]
    NotConfigured,

    #[error("No active session")]
    NoSession,

    #[error("No verified MFA factor")]
    NoVerifiedFactor,

    #[error("No MFA challenge in progress")]
    NoChallenge,
}

impl ClientError {
    /// Status reported by the service, if it answered at all
    pub fn api_status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The challenge is gone (expired or already used); a new one is needed
    pub fn is_challenge_expired(&self) -> bool {
        matches!(self.api_status(), Some(410 | 409))
    }

    pub fn is_invalid_code(&self) -> bool {
        self.api_status() == Some(422)
    }

    /// Verification attempts exhausted for now
    pub fn is_rate_limited(&self) -> bool {
        self.api_status() == Some(429)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.api_status() == Some(401) || matches!(self, ClientError::NoSession)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Api { status, .. } => ErrorKind::from_status(*status),
            ClientError::Http(_) | ClientError::NotConfigured => ErrorKind::ServiceUnavailable,
            ClientError::NoSession => ErrorKind::Unauthorized,
            ClientError::NoVerifiedFactor | ClientError::NoChallenge => ErrorKind::BadRequest,
            ClientError::InvalidUrl(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    pub fn log(&self) {
        match self {
            ClientError::Http(e) => tracing::error!(error = %e, "Backend service unreachable"),
            ClientError::InvalidUrl(e) => tracing::error!(error = %e, "Invalid service URL"),
            ClientError::Api { status, message } if *status >= 500 => {
                tracing::error!(status, message = %message, "Backend service error")
            }
            _ => tracing::debug!(error = %self, "Backend call rejected"),
        }
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> ClientError {
        ClientError::Api {
            status,
            message: "x".to_string(),
        }
    }

    #[test]
    fn test_classification() {
        assert!(api(410).is_challenge_expired());
        assert!(api(409).is_challenge_expired());
        assert!(!api(422).is_challenge_expired());
        assert!(api(422).is_invalid_code());
        assert!(api(429).is_rate_limited());
        assert!(!api(422).is_rate_limited());
        assert!(api(401).is_unauthorized());
        assert!(ClientError::NoSession.is_unauthorized());
        assert_eq!(ClientError::NotConfigured.api_status(), None);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(api(428).status_code(), StatusCode::PRECONDITION_REQUIRED);
        assert_eq!(api(418).kind(), ErrorKind::BadRequest);
        assert_eq!(api(502).kind(), ErrorKind::InternalServerError);
        assert_eq!(
            ClientError::NotConfigured.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
