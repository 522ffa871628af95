//! `From` conversions into [`AppError`] and the axum response
//!
//! The sqlx and axum parts are behind the `sqlx` / `axum` features.

use super::app_error::AppError;
use super::kind::ErrorKind;

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::Forbidden,
            std::io::ErrorKind::TimedOut => ErrorKind::ServiceUnavailable,
            _ => ErrorKind::InternalServerError,
        };
        AppError::new(kind, "I/O operation failed").with_source(err)
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::bad_request("Invalid identifier").with_source(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            AppError::bad_request(format!("Malformed JSON: {err}")).with_source(err)
        } else {
            AppError::internal("JSON serialization error").with_source(err)
        }
    }
}

/// Map a Postgres SQLSTATE onto a kind and message
///
/// <https://www.postgresql.org/docs/current/errcodes-appendix.html>
#[cfg(any(feature = "sqlx", test))]
fn classify_sqlstate(code: &str) -> (ErrorKind, &'static str) {
    match code {
        "23505" => (ErrorKind::Conflict, "Duplicate key value"),
        "23503" => (ErrorKind::Conflict, "Referenced record does not exist"),
        "23502" | "23514" => (ErrorKind::BadRequest, "Constraint violation"),
        // Serialization failure of a REPEATABLE READ snapshot
        "40001" | "40P01" => (ErrorKind::ServiceUnavailable, "Concurrent update, retry"),
        _ if ["08", "53", "57"].iter().any(|class| code.starts_with(class)) => {
            (ErrorKind::ServiceUnavailable, "Database unavailable")
        }
        _ => (ErrorKind::InternalServerError, "Database error"),
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let (kind, message) = match &err {
            sqlx::Error::RowNotFound => (ErrorKind::NotFound, "Record not found"),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                (ErrorKind::ServiceUnavailable, "Database unavailable")
            }
            sqlx::Error::Database(db) => db
                .code()
                .map(|code| classify_sqlstate(&code))
                .unwrap_or((ErrorKind::InternalServerError, "Database error")),
            _ => (ErrorKind::InternalServerError, "Database error"),
        };
        AppError::new(kind, message).with_source(err)
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::{HeaderValue, StatusCode, header};

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = (status, Json(self.problem())).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: AppError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no").into();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_uuid_and_json_are_bad_requests() {
        let err: AppError = uuid::Uuid::parse_str("not-a-uuid").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let err: AppError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_sqlstate_classes() {
        assert_eq!(classify_sqlstate("23505").0, ErrorKind::Conflict);
        assert_eq!(classify_sqlstate("23514").0, ErrorKind::BadRequest);
        assert_eq!(classify_sqlstate("40001").0, ErrorKind::ServiceUnavailable);
        assert_eq!(classify_sqlstate("57P01").0, ErrorKind::ServiceUnavailable);
        assert_eq!(classify_sqlstate("08006").0, ErrorKind::ServiceUnavailable);
        assert_eq!(classify_sqlstate("42P01").0, ErrorKind::InternalServerError);
    }
}
