//! Backend Service Client contract

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::client::error::ClientResult;
use crate::domain::value_object::{
    aal::AssuranceLevels,
    mfa::{ChallengeId, FactorId},
};
use crate::presentation::dto::{
    ChallengeResponse, EnrollResponse, FactorListResponse, SessionDto, UnenrollResponse,
};

/// Auth-state change pushed to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(SessionDto),
    SignedOut,
    TokenRefreshed(SessionDto),
    MfaVerified(SessionDto),
}

impl AuthEvent {
    /// Session after the event; `None` means signed out
    pub fn session(&self) -> Option<&SessionDto> {
        match self {
            AuthEvent::SignedIn(s) | AuthEvent::TokenRefreshed(s) | AuthEvent::MfaVerified(s) => {
                Some(s)
            }
            AuthEvent::SignedOut => None,
        }
    }
}

/// Stored object as reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub key: String,
    pub url: String,
    pub size: u64,
}

/// Auth, MFA and storage calls against the backend service
///
/// Implementations keep the current session themselves and broadcast an
/// `AuthEvent` on every change.
#[trait_variant::make(BackendClient: Send)]
pub trait LocalBackendClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> ClientResult<SessionDto>;

    async fn sign_out(&self) -> ClientResult<()>;

    /// Current session, `None` when signed out
    async fn get_session(&self) -> ClientResult<Option<SessionDto>>;

    async fn refresh_session(&self) -> ClientResult<SessionDto>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    async fn list_factors(&self) -> ClientResult<FactorListResponse>;

    async fn enroll_totp(&self, friendly_name: Option<&str>) -> ClientResult<EnrollResponse>;

    async fn challenge(&self, factor_id: &FactorId) -> ClientResult<ChallengeResponse>;

    async fn verify(
        &self,
        factor_id: &FactorId,
        challenge_id: &ChallengeId,
        code: &str,
    ) -> ClientResult<SessionDto>;

    async fn unenroll(&self, factor_id: &FactorId) -> ClientResult<UnenrollResponse>;

    /// Live assurance level; trusted over the level embedded in the session
    async fn get_assurance_level(&self) -> ClientResult<AssuranceLevels>;

    async fn upload_image(&self, content_type: &str, bytes: Vec<u8>) -> ClientResult<UploadedImage>;

    async fn remove_image(&self, key: &str) -> ClientResult<()>;
}
