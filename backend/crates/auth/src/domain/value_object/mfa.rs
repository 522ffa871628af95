//! MFA value objects: factor / challenge ids, factor type and status

use kernel::error::app_error::AppError;
use kernel::id::{Id, markers};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub type FactorId = Id<markers::Factor>;
pub type ChallengeId = Id<markers::Challenge>;

/// Only TOTP is supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorType {
    #[default]
    Totp,
}

impl FactorType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FactorType::Totp => "totp",
        }
    }
}

impl FromStr for FactorType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "totp" => Ok(FactorType::Totp),
            other => Err(AppError::internal(format!("Unknown factor type: {other}"))),
        }
    }
}

/// Enrollment state of a factor
///
/// Only `Verified` factors count toward the aal2 requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorStatus {
    #[default]
    Unverified,
    Verified,
}

impl FactorStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FactorStatus::Unverified => "unverified",
            FactorStatus::Verified => "verified",
        }
    }

    pub const fn is_verified(&self) -> bool {
        matches!(self, FactorStatus::Verified)
    }
}

impl FromStr for FactorStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unverified" => Ok(FactorStatus::Unverified),
            "verified" => Ok(FactorStatus::Verified),
            other => Err(AppError::internal(format!("Unknown factor status: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [FactorStatus::Unverified, FactorStatus::Verified] {
            assert_eq!(status.as_str().parse::<FactorStatus>().unwrap(), status);
        }
        assert_eq!(
            serde_json::to_string(&FactorStatus::Verified).unwrap(),
            "\"verified\""
        );
        assert!(!FactorStatus::Unverified.is_verified());
    }
}
