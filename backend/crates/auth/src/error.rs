//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Email already registered
    #[error("Email is already registered")]
    EmailTaken,

    /// Invalid credentials (unknown email or wrong password)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account is locked (too many failed attempts)
    #[error("Account is temporarily locked")]
    AccountLocked,

    /// Session not found or expired
    #[error("Session not found or expired")]
    SessionInvalid,

    /// Refresh token unknown, rotated away or expired
    #[error("Refresh token is invalid or expired")]
    RefreshTokenInvalid,

    /// MFA factor not found (or owned by someone else)
    #[error("MFA factor not found")]
    FactorNotFound,

    /// MFA challenge not found (or not issued for this factor)
    #[error("MFA challenge not found")]
    ChallengeNotFound,

    /// MFA challenge TTL exceeded; a new challenge is needed
    #[error("MFA challenge has expired")]
    ChallengeExpired,

    /// MFA challenge already consumed
    #[error("MFA challenge was already used")]
    ChallengeAlreadyUsed,

    /// Wrong TOTP code; the challenge stays usable
    #[error("Invalid verification code")]
    InvalidCode,

    /// Verification attempts exhausted for this factor
    #[error("Too many verification attempts")]
    TooManyAttempts { retry_after_secs: u64 },

    /// Operation requires an aal2 session
    #[error("Two-factor verification is required for this operation")]
    InsufficientAal,

    /// Input validation error
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserNotFound | AuthError::FactorNotFound | AuthError::ChallengeNotFound => {
                ErrorKind::NotFound
            }
            AuthError::EmailTaken | AuthError::ChallengeAlreadyUsed => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::SessionInvalid
            | AuthError::RefreshTokenInvalid => ErrorKind::Unauthorized,
            AuthError::AccountLocked => ErrorKind::Locked,
            AuthError::ChallengeExpired => ErrorKind::Gone,
            AuthError::InvalidCode => ErrorKind::UnprocessableEntity,
            AuthError::InsufficientAal => ErrorKind::PreconditionRequired,
            AuthError::TooManyAttempts { .. } => ErrorKind::TooManyRequests,
            AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            AuthError::InvalidCode => err.with_action("Check the code in your authenticator app"),
            AuthError::ChallengeExpired => err.with_action("Request a new challenge"),
            AuthError::AccountLocked => err.with_action("Try again in a few minutes"),
            AuthError::InsufficientAal => err.with_action("Verify your second factor first"),
            AuthError::TooManyAttempts { retry_after_secs } => {
                err.with_action(format!("Try again in {retry_after_secs} seconds"))
            }
            _ => err,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountLocked => {
                tracing::warn!("Login attempt on locked account");
            }
            AuthError::InvalidCode => {
                tracing::warn!("Invalid MFA code submitted");
            }
            AuthError::TooManyAttempts { retry_after_secs } => {
                tracing::warn!(retry_after_secs, "MFA verification throttled");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        let mut response = self.to_app_error().into_response();
        if let AuthError::TooManyAttempts { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AuthError::Validation(err.message().to_string()),
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<platform::token::TokenError> for AuthError {
    fn from(err: platform::token::TokenError) -> Self {
        match err {
            platform::token::TokenError::InvalidKey => AuthError::Internal(err.to_string()),
            _ => AuthError::SessionInvalid,
        }
    }
}

impl From<platform::rate_limit::RateLimitError> for AuthError {
    fn from(err: platform::rate_limit::RateLimitError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
