//! Credentials Entity
//!
//! Password hash and sign-in failure tracking, kept apart from `User`
//! so profile reads never load secret material.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{user_id::UserId, user_password::UserPassword};

#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: UserId,
    pub password_hash: UserPassword,
    /// Consecutive failures since the last successful sign-in
    pub failed_count: u16,
    pub last_failed_at: Option<DateTime<Utc>>,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credentials {
    /// Failures before temporary lockout
    pub const MAX_FAILURES: u16 = 5;
    pub const LOCKOUT_MINUTES: i64 = 15;

    pub fn new(user_id: UserId, password_hash: UserPassword) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            password_hash,
            failed_count: 0,
            last_failed_at: None,
            locked_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked_until.is_some_and(|until| Utc::now() < until)
    }

    pub fn record_failure(&mut self) {
        let now = Utc::now();
        self.failed_count = self.failed_count.saturating_add(1);
        self.last_failed_at = Some(now);
        self.updated_at = now;

        if self.failed_count >= Self::MAX_FAILURES {
            self.locked_until = Some(now + Duration::minutes(Self::LOCKOUT_MINUTES));
        }
    }

    pub fn reset_failures(&mut self) {
        self.failed_count = 0;
        self.last_failed_at = None;
        self.locked_until = None;
        self.updated_at = Utc::now();
    }

    pub fn update_password(&mut self, password_hash: UserPassword) {
        self.password_hash = password_hash;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;

    fn credentials() -> Credentials {
        let raw = RawPassword::for_verification("irrelevant".to_string());
        Credentials::new(UserId::new(), UserPassword::from_raw(&raw, None).unwrap())
    }

    #[test]
    fn test_lockout_after_max_failures() {
        let mut creds = credentials();
        for _ in 0..Credentials::MAX_FAILURES - 1 {
            creds.record_failure();
            assert!(!creds.is_locked());
        }
        creds.record_failure();
        assert!(creds.is_locked());
        assert_eq!(creds.failed_count, Credentials::MAX_FAILURES);

        creds.reset_failures();
        assert!(!creds.is_locked());
        assert_eq!(creds.failed_count, 0);
    }

    #[test]
    fn test_expired_lock_is_not_locked() {
        let mut creds = credentials();
        creds.locked_until = Some(Utc::now() - Duration::seconds(1));
        assert!(!creds.is_locked());
    }
}
