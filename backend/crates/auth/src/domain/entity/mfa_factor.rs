//! MFA Factor Entity

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    mfa::{FactorId, FactorStatus, FactorType},
    totp_secret::TotpSecret,
    user_id::UserId,
};

#[derive(Debug, Clone)]
pub struct MfaFactor {
    pub factor_id: FactorId,
    pub user_id: UserId,
    pub factor_type: FactorType,
    pub friendly_name: Option<String>,
    pub secret: TotpSecret,
    pub status: FactorStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MfaFactor {
    /// Fresh TOTP enrollment; unverified until the first code is accepted
    pub fn enroll_totp(user_id: UserId, friendly_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            factor_id: FactorId::new(),
            user_id,
            factor_type: FactorType::Totp,
            friendly_name,
            secret: TotpSecret::generate(),
            status: FactorStatus::Unverified,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.status.is_verified()
    }

    pub fn mark_verified(&mut self) {
        self.status = FactorStatus::Verified;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrollment_starts_unverified() {
        let mut factor = MfaFactor::enroll_totp(UserId::new(), Some("Móvil".to_string()));
        assert_eq!(factor.factor_type, FactorType::Totp);
        assert!(!factor.is_verified());

        factor.mark_verified();
        assert!(factor.is_verified());
    }
}
