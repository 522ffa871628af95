//! Client used when no backend service is configured
//!
//! Reads report "signed out"; everything else fails with `NotConfigured`.

use tokio::sync::broadcast;

use crate::client::backend::{AuthEvent, BackendClient, UploadedImage};
use crate::client::error::{ClientError, ClientResult};
use crate::domain::value_object::{
    aal::AssuranceLevels,
    mfa::{ChallengeId, FactorId},
};
use crate::presentation::dto::{
    ChallengeResponse, EnrollResponse, FactorListResponse, SessionDto, UnenrollResponse,
};

pub struct NoopClient {
    events: broadcast::Sender<AuthEvent>,
}

impl NoopClient {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(1);
        Self { events }
    }
}

impl Default for NoopClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendClient for NoopClient {
    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> ClientResult<SessionDto> {
        Err(ClientError::NotConfigured)
    }

    async fn sign_out(&self) -> ClientResult<()> {
        Ok(())
    }

    async fn get_session(&self) -> ClientResult<Option<SessionDto>> {
        Ok(None)
    }

    async fn refresh_session(&self) -> ClientResult<SessionDto> {
        Err(ClientError::NotConfigured)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn list_factors(&self) -> ClientResult<FactorListResponse> {
        Err(ClientError::NotConfigured)
    }

    async fn enroll_totp(&self, _friendly_name: Option<&str>) -> ClientResult<EnrollResponse> {
        Err(ClientError::NotConfigured)
    }

    async fn challenge(&self, _factor_id: &FactorId) -> ClientResult<ChallengeResponse> {
        Err(ClientError::NotConfigured)
    }

    async fn verify(
        &self,
        _factor_id: &FactorId,
        _challenge_id: &ChallengeId,
        _code: &str,
    ) -> ClientResult<SessionDto> {
        Err(ClientError::NotConfigured)
    }

    async fn unenroll(&self, _factor_id: &FactorId) -> ClientResult<UnenrollResponse> {
        Err(ClientError::NotConfigured)
    }

    async fn get_assurance_level(&self) -> ClientResult<AssuranceLevels> {
        Err(ClientError::NotConfigured)
    }

    async fn upload_image(&self, _content_type: &str, _bytes: Vec<u8>) -> ClientResult<UploadedImage> {
        Err(ClientError::NotConfigured)
    }

    async fn remove_image(&self, _key: &str) -> ClientResult<()> {
        Err(ClientError::NotConfigured)
    }
}
