//! API DTOs (Data Transfer Objects)
//!
//! Shared by the HTTP handlers and `client::HttpBackendClient`, so every
//! type here is both `Serialize` and `Deserialize`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{IssuedSession, SessionView};
use crate::domain::entity::{auth_session::AuthSession, mfa_factor::MfaFactor, user::User};
use crate::domain::gate::{GateFactor, GateState};
use crate::domain::value_object::{
    aal::Aal,
    mfa::{ChallengeId, FactorId, FactorStatus, FactorType},
    user_id::UserId,
};

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id,
            email: user.email.to_string(),
            display_name: user.display_name.clone(),
            last_sign_in_at: user.last_sign_in_at,
        }
    }
}

/// Client-visible session
///
/// `aal` is a snapshot taken when the session was issued or read; the
/// assurance-level endpoint is the live source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub access_token: String,
    /// Only present when a token was just issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at_ms: i64,
    pub aal: Aal,
    pub user: UserDto,
}

impl SessionDto {
    fn from_parts(access_token: String, session: &AuthSession, user: &User) -> Self {
        Self {
            access_token,
            refresh_token: None,
            expires_at_ms: session.expires_at_ms,
            aal: session.aal,
            user: UserDto::from(user),
        }
    }

    pub fn from_view(access_token: &str, view: &SessionView) -> Self {
        Self::from_parts(access_token.to_string(), &view.session, &view.user)
    }
}

impl From<IssuedSession> for SessionDto {
    fn from(issued: IssuedSession) -> Self {
        Self {
            refresh_token: Some(issued.refresh_token),
            ..Self::from_parts(issued.access_token, &issued.session, &issued.user)
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub session: Option<SessionDto>,
}

// ============================================================================
// MFA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorDto {
    pub id: FactorId,
    pub factor_type: FactorType,
    pub friendly_name: Option<String>,
    pub status: FactorStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&MfaFactor> for FactorDto {
    fn from(factor: &MfaFactor) -> Self {
        Self {
            id: factor.factor_id,
            factor_type: factor.factor_type,
            friendly_name: factor.friendly_name.clone(),
            status: factor.status,
            created_at: factor.created_at,
            updated_at: factor.updated_at,
        }
    }
}

impl FactorDto {
    pub fn is_verified(&self) -> bool {
        self.status.is_verified()
    }
}

impl GateFactor for FactorDto {
    fn factor_status(&self) -> FactorStatus {
        self.status
    }
}

/// `all` holds every factor; `totp` only the verified TOTP ones
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactorListResponse {
    pub all: Vec<FactorDto>,
    pub totp: Vec<FactorDto>,
}

impl FactorListResponse {
    pub fn new(factors: &[MfaFactor]) -> Self {
        let all: Vec<FactorDto> = factors.iter().map(FactorDto::from).collect();
        let totp = all
            .iter()
            .filter(|f| f.factor_type == FactorType::Totp && f.is_verified())
            .cloned()
            .collect();
        Self { all, totp }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    #[serde(default)]
    pub factor_type: FactorType,
    pub friendly_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpEnrollment {
    /// `data:image/png;base64,...`
    pub qr_code: String,
    pub secret: String,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollResponse {
    pub id: FactorId,
    pub factor_type: FactorType,
    pub friendly_name: Option<String>,
    pub totp: TotpEnrollment,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    pub factor_id: FactorId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub id: ChallengeId,
    pub factor_id: FactorId,
    pub expires_at_ms: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub factor_id: FactorId,
    pub challenge_id: ChallengeId,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnenrollRequest {
    pub factor_id: FactorId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnenrollResponse {
    pub id: FactorId,
}

// ============================================================================
// Diagnostics
// ============================================================================

/// What the request gate sees for the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthDiagnosticsResponse {
    pub gate_state: GateState,
    pub user_id: Option<UserId>,
    pub email: Option<String>,
    pub aal: Option<Aal>,
    pub verified_factors: usize,
    pub unverified_factors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::email::Email;

    #[test]
    fn test_factor_list_splits_verified_totp() {
        let user_id = UserId::new();
        let pending = MfaFactor::enroll_totp(user_id, None);
        let mut verified = MfaFactor::enroll_totp(user_id, Some("Móvil".to_string()));
        verified.mark_verified();

        let list = FactorListResponse::new(&[pending, verified.clone()]);
        assert_eq!(list.all.len(), 2);
        assert_eq!(list.totp.len(), 1);
        assert_eq!(list.totp[0].id, verified.factor_id);
    }

    #[test]
    fn test_session_dto_wire_format() {
        let user = User::new(Email::new("admin@despacho.es").unwrap(), None);
        let session = AuthSession::new(
            user.user_id,
            vec![0; 32],
            chrono::Duration::hours(1),
            chrono::Duration::days(1),
        );
        let dto = SessionDto::from_view(
            "token",
            &SessionView {
                session,
                user: user.clone(),
            },
        );
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["accessToken"], "token");
        assert_eq!(json["aal"], "aal1");
        assert_eq!(json["user"]["email"], "admin@despacho.es");
        assert!(json.get("refreshToken").is_none());

        let back: SessionDto = serde_json::from_value(json).unwrap();
        assert_eq!(back, dto);
    }
}
