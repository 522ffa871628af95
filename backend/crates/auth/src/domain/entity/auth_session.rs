//! Auth Session Entity
//!
//! Server-side session referenced by a signed access token. The assurance
//! level lives here so every request re-derives it from the store rather
//! than trusting anything the client holds.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::value_object::{aal::Aal, user_id::UserId};

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub aal: Aal,
    /// SHA-256 of the current refresh token
    pub refresh_token_hash: Vec<u8>,
    /// Access expiry (Unix ms)
    pub expires_at_ms: i64,
    /// Refresh expiry (Unix ms)
    pub refresh_expires_at_ms: i64,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AuthSession {
    /// New password-only session
    pub fn new(
        user_id: UserId,
        refresh_token_hash: Vec<u8>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            aal: Aal::Aal1,
            refresh_token_hash,
            expires_at_ms: (now + access_ttl).timestamp_millis(),
            refresh_expires_at_ms: (now + refresh_ttl).timestamp_millis(),
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }

    pub fn is_refresh_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.refresh_expires_at_ms
    }

    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    pub fn remaining_ms(&self) -> i64 {
        (self.expires_at_ms - Utc::now().timestamp_millis()).max(0)
    }

    /// Swap in a new refresh token and push the access expiry forward
    pub fn rotate(&mut self, refresh_token_hash: Vec<u8>, access_ttl: Duration) {
        let now = Utc::now();
        self.refresh_token_hash = refresh_token_hash;
        self.expires_at_ms = (now + access_ttl).timestamp_millis();
        self.last_activity_at = now;
    }

    pub fn elevate(&mut self) {
        self.aal = Aal::Aal2;
        self.last_activity_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_at_aal1() {
        let session = AuthSession::new(
            UserId::new(),
            vec![1; 32],
            Duration::hours(1),
            Duration::days(30),
        );
        assert_eq!(session.aal, Aal::Aal1);
        assert!(!session.is_expired());
        assert!(!session.is_refresh_expired());
        assert!(session.remaining_ms() > 0);
    }

    #[test]
    fn test_rotate_and_elevate() {
        let mut session = AuthSession::new(
            UserId::new(),
            vec![1; 32],
            Duration::milliseconds(-1),
            Duration::days(30),
        );
        assert!(session.is_expired());
        assert_eq!(session.remaining_ms(), 0);

        session.rotate(vec![2; 32], Duration::hours(1));
        assert!(!session.is_expired());
        assert_eq!(session.refresh_token_hash, vec![2; 32]);

        session.elevate();
        assert_eq!(session.aal, Aal::Aal2);
    }
}
