//! Error Kind
//!
//! [`ErrorKind`] classifies every failure the API can report and fixes its
//! HTTP status. Auth adds `Locked` (lockout) and `PreconditionRequired`
//! (an `aal2` session is needed).

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    /// Expired MFA challenge
    Gone,
    /// Image upload over the storage limit
    PayloadTooLarge,
    UnprocessableEntity,
    /// Account locked after repeated failed sign-ins
    Locked,
    /// Operation needs an `aal2` session
    PreconditionRequired,
    TooManyRequests,
    InternalServerError,
    /// Database down, storage or backend not configured
    ServiceUnavailable,
}

/// (kind, status, reason phrase)
const TABLE: [(ErrorKind, u16, &str); 13] = [
    (ErrorKind::BadRequest, 400, "Bad Request"),
    (ErrorKind::Unauthorized, 401, "Unauthorized"),
    (ErrorKind::Forbidden, 403, "Forbidden"),
    (ErrorKind::NotFound, 404, "Not Found"),
    (ErrorKind::Conflict, 409, "Conflict"),
    (ErrorKind::Gone, 410, "Gone"),
    (ErrorKind::PayloadTooLarge, 413, "Payload Too Large"),
    (ErrorKind::UnprocessableEntity, 422, "Unprocessable Entity"),
    (ErrorKind::Locked, 423, "Locked"),
    (ErrorKind::PreconditionRequired, 428, "Precondition Required"),
    (ErrorKind::TooManyRequests, 429, "Too Many Requests"),
    (ErrorKind::InternalServerError, 500, "Internal Server Error"),
    (ErrorKind::ServiceUnavailable, 503, "Service Unavailable"),
];

impl ErrorKind {
    fn entry(&self) -> (u16, &'static str) {
        TABLE
            .iter()
            .find(|(kind, _, _)| kind == self)
            .map(|(_, status, reason)| (*status, *reason))
            .unwrap_or((500, "Internal Server Error"))
    }

    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::PreconditionRequired.status_code(), 428);
    /// ```
    pub fn status_code(&self) -> u16 {
        self.entry().0
    }

    /// Reason phrase, used as the problem `title`
    pub fn as_str(&self) -> &'static str {
        self.entry().1
    }

    /// Reverse lookup for statuses received from the backend; unknown
    /// 4xx/5xx codes fall back to `BadRequest`/`InternalServerError`
    pub fn from_status(status: u16) -> Self {
        TABLE
            .iter()
            .find(|(_, s, _)| *s == status)
            .map(|(kind, _, _)| *kind)
            .unwrap_or(if (400..500).contains(&status) {
                ErrorKind::BadRequest
            } else {
                ErrorKind::InternalServerError
            })
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_an_entry() {
        for (kind, status, _) in TABLE {
            assert_eq!(kind.status_code(), status);
            assert_eq!(ErrorKind::from_status(status), kind);
        }
    }

    #[test]
    fn test_unknown_statuses() {
        assert_eq!(ErrorKind::from_status(418), ErrorKind::BadRequest);
        assert_eq!(ErrorKind::from_status(502), ErrorKind::InternalServerError);
    }

    #[test]
    fn test_server_errors() {
        assert!(ErrorKind::ServiceUnavailable.is_server_error());
        assert!(!ErrorKind::Locked.is_server_error());
        assert_eq!(ErrorKind::Gone.to_string(), "Gone");
    }
}
