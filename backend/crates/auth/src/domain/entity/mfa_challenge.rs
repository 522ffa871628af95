//! MFA Challenge Entity
//!
//! A short-lived, single-use verification attempt against one factor.
//! A wrong code leaves the challenge open; only expiry or success closes it.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{
    mfa::{ChallengeId, FactorId},
    user_id::UserId,
};

#[derive(Debug, Clone)]
pub struct MfaChallenge {
    pub challenge_id: ChallengeId,
    pub factor_id: FactorId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at_ms: i64,
    pub verified_at: Option<DateTime<Utc>>,
}

impl MfaChallenge {
    pub fn new(factor_id: FactorId, user_id: UserId, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            challenge_id: ChallengeId::new(),
            factor_id,
            user_id,
            created_at: now,
            expires_at_ms: (now + ttl).timestamp_millis(),
            verified_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }

    pub fn is_used(&self) -> bool {
        self.verified_at.is_some()
    }

    pub fn mark_verified(&mut self) {
        self.verified_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_lifecycle() {
        let mut challenge =
            MfaChallenge::new(FactorId::new(), UserId::new(), Duration::minutes(5));
        assert!(!challenge.is_expired());
        assert!(!challenge.is_used());

        challenge.mark_verified();
        assert!(challenge.is_used());

        let expired = MfaChallenge::new(FactorId::new(), UserId::new(), Duration::seconds(-1));
        assert!(expired.is_expired());
    }
}
