//! HTTP implementation of `BackendClient`
//!
//! Holds the current session in memory and sends the access token as a
//! bearer token. Use `HttpBackendClient::shared` to get the process-wide
//! instance; building several would duplicate auth-state subscriptions.

use std::sync::{Arc, OnceLock};

use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{RwLock, broadcast};
use url::Url;

use crate::client::backend::{AuthEvent, BackendClient, UploadedImage};
use crate::client::error::{ClientError, ClientResult};
use crate::domain::value_object::{
    aal::AssuranceLevels,
    mfa::{ChallengeId, FactorId},
};
use crate::presentation::dto::{
    ChallengeRequest, ChallengeResponse, EnrollRequest, EnrollResponse, FactorListResponse,
    RefreshRequest, SessionDto, SessionStatusResponse, SignInRequest, UnenrollRequest,
    UnenrollResponse, VerifyRequest,
};

const EVENT_CAPACITY: usize = 16;

static SHARED: OnceLock<Arc<HttpBackendClient>> = OnceLock::new();

pub struct HttpBackendClient {
    http: reqwest::Client,
    /// API root, always ending in `/` (e.g. `http://localhost:3000/api/`)
    base_url: Url,
    session: RwLock<Option<SessionDto>>,
    events: broadcast::Sender<AuthEvent>,
}

impl HttpBackendClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(&base)?,
            session: RwLock::new(None),
            events,
        })
    }

    /// Process-wide instance; the first call's URL wins
    pub fn shared(base_url: &str) -> ClientResult<Arc<Self>> {
        if let Some(client) = SHARED.get() {
            return Ok(client.clone());
        }
        let _ = SHARED.set(Arc::new(Self::new(base_url)?));
        SHARED.get().cloned().ok_or(ClientError::NotConfigured)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Session currently held, without a network call
    pub async fn current_session(&self) -> Option<SessionDto> {
        self.session.read().await.clone()
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        Ok(self.http.request(method, url))
    }

    async fn authed(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or(ClientError::NoSession)?;
        Ok(self.request(method, path)?.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        request: RequestBuilder,
        body: &B,
    ) -> ClientResult<T> {
        Self::send(request.json(body)).await
    }

    /// Turn an error status into `ClientError::Api` using the problem detail
    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("detail")
                .or_else(|| body.get("title"))
                .and_then(|v| v.as_str())
                .map(str::to_string),
            Err(_) => None,
        }
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn store(&self, session: Option<SessionDto>, event: AuthEvent) {
        *self.session.write().await = session;
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Keep the refresh token across reads that do not return one
    async fn merge(&self, mut fresh: SessionDto) -> SessionDto {
        if fresh.refresh_token.is_none() {
            fresh.refresh_token = self
                .session
                .read()
                .await
                .as_ref()
                .and_then(|s| s.refresh_token.clone());
        }
        fresh
    }
}

impl BackendClient for HttpBackendClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> ClientResult<SessionDto> {
        let body = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let session: SessionDto =
            Self::send_json(self.request(Method::POST, "auth/signin")?, &body).await?;

        self.store(Some(session.clone()), AuthEvent::SignedIn(session.clone()))
            .await;
        Ok(session)
    }

    async fn sign_out(&self) -> ClientResult<()> {
        if let Ok(request) = self.authed(Method::POST, "auth/signout").await {
            Self::check(request.send().await?).await?;
        }
        self.store(None, AuthEvent::SignedOut).await;
        Ok(())
    }

    async fn get_session(&self) -> ClientResult<Option<SessionDto>> {
        let Ok(request) = self.authed(Method::GET, "auth/session").await else {
            return Ok(None);
        };
        let status: SessionStatusResponse = Self::send(request).await?;

        match status.session {
            Some(session) if status.authenticated => {
                let session = self.merge(session).await;
                *self.session.write().await = Some(session.clone());
                Ok(Some(session))
            }
            // Access token expired; the refresh token may still be good
            _ => match self.refresh_session().await {
                Ok(session) => Ok(Some(session)),
                Err(e) if e.is_unauthorized() => {
                    self.store(None, AuthEvent::SignedOut).await;
                    Ok(None)
                }
                Err(e) => Err(e),
            },
        }
    }

    async fn refresh_session(&self) -> ClientResult<SessionDto> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .and_then(|s| s.refresh_token.clone())
            .ok_or(ClientError::NoSession)?;

        let session: SessionDto = Self::send_json(
            self.request(Method::POST, "auth/refresh")?,
            &RefreshRequest { refresh_token },
        )
        .await?;

        self.store(Some(session.clone()), AuthEvent::TokenRefreshed(session.clone()))
            .await;
        Ok(session)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn list_factors(&self) -> ClientResult<FactorListResponse> {
        Self::send(self.authed(Method::GET, "auth/mfa/factors").await?).await
    }

    async fn enroll_totp(&self, friendly_name: Option<&str>) -> ClientResult<EnrollResponse> {
        let body = EnrollRequest {
            friendly_name: friendly_name.map(str::to_string),
            ..Default::default()
        };
        Self::send_json(self.authed(Method::POST, "auth/mfa/enroll").await?, &body).await
    }

    async fn challenge(&self, factor_id: &FactorId) -> ClientResult<ChallengeResponse> {
        let body = ChallengeRequest {
            factor_id: *factor_id,
        };
        Self::send_json(self.authed(Method::POST, "auth/mfa/challenge").await?, &body).await
    }

    async fn verify(
        &self,
        factor_id: &FactorId,
        challenge_id: &ChallengeId,
        code: &str,
    ) -> ClientResult<SessionDto> {
        let body = VerifyRequest {
            factor_id: *factor_id,
            challenge_id: *challenge_id,
            code: code.to_string(),
        };
        let session: SessionDto =
            Self::send_json(self.authed(Method::POST, "auth/mfa/verify").await?, &body).await?;

        self.store(Some(session.clone()), AuthEvent::MfaVerified(session.clone()))
            .await;
        Ok(session)
    }

    async fn unenroll(&self, factor_id: &FactorId) -> ClientResult<UnenrollResponse> {
        let body = UnenrollRequest {
            factor_id: *factor_id,
        };
        Self::send_json(self.authed(Method::POST, "auth/mfa/unenroll").await?, &body).await
    }

    async fn get_assurance_level(&self) -> ClientResult<AssuranceLevels> {
        Self::send(self.authed(Method::GET, "auth/mfa/aal").await?).await
    }

    async fn upload_image(&self, content_type: &str, bytes: Vec<u8>) -> ClientResult<UploadedImage> {
        let request = self
            .authed(Method::POST, "admin/images")
            .await?
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        Self::send(request).await
    }

    async fn remove_image(&self, key: &str) -> ClientResult<()> {
        let path = format!("admin/images/{}", key.trim_start_matches('/'));
        Self::check(self.authed(Method::DELETE, &path).await?.send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalised() {
        let client = HttpBackendClient::new("http://localhost:3000/api").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:3000/api/");
        assert!(HttpBackendClient::new("not a url").is_err());
    }

    #[test]
    fn test_shared_is_singleton() {
        let a = HttpBackendClient::shared("http://localhost:3000/api/").unwrap();
        let b = HttpBackendClient::shared("http://other.example/api/").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_calls_without_session() {
        let client = HttpBackendClient::new("http://127.0.0.1:9/api/").unwrap();
        assert!(client.get_session().await.unwrap().is_none());
        assert!(matches!(
            client.list_factors().await,
            Err(ClientError::NoSession)
        ));
        assert!(matches!(
            client.refresh_session().await,
            Err(ClientError::NoSession)
        ));
    }
}
