//! Session/Auth Context
//!
//! Reactive `{user, session, loading}` state sourced from a `BackendClient`.
//! Every auth event overwrites the state; the last event to arrive wins.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::client::backend::{AuthEvent, BackendClient};
use crate::client::error::ClientResult;
use crate::domain::value_object::{
    aal::AssuranceLevels,
    mfa::{ChallengeId, FactorId},
};
use crate::presentation::dto::{
    ChallengeResponse, EnrollResponse, FactorListResponse, SessionDto, UnenrollResponse, UserDto,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<UserDto>,
    pub session: Option<SessionDto>,
    pub loading: bool,
}

impl AuthState {
    fn loading() -> Self {
        Self {
            loading: true,
            ..Default::default()
        }
    }

    fn from_session(session: Option<SessionDto>) -> Self {
        Self {
            user: session.as_ref().map(|s| s.user.clone()),
            session,
            loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

pub struct AuthContext<C> {
    client: Arc<C>,
    state: Arc<watch::Sender<AuthState>>,
    listener: JoinHandle<()>,
}

impl<C> AuthContext<C>
where
    C: BackendClient + Sync + 'static,
{
    /// Subscribe to the client's auth events, then load the current session
    pub async fn init(client: Arc<C>) -> Self {
        let (state, _) = watch::channel(AuthState::loading());
        let state = Arc::new(state);

        let mut events = client.subscribe();
        let listener = {
            let state = state.clone();
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => {
                            let session = event.session().cloned();
                            if matches!(event, AuthEvent::SignedOut) {
                                tracing::debug!("Auth state: signed out");
                            }
                            state.send_replace(AuthState::from_session(session));
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Auth event listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            })
        };

        let context = Self {
            client,
            state,
            listener,
        };

        let initial = match context.client.get_session().await {
            Ok(session) => AuthState::from_session(session),
            Err(e) => {
                tracing::warn!(error = %e, "Could not load current session");
                AuthState::from_session(None)
            }
        };
        // An event may already have settled the state
        context.state.send_if_modified(|current| {
            if current.loading {
                *current = initial;
                true
            } else {
                false
            }
        });

        context
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    fn apply(&self, session: Option<SessionDto>) {
        self.state.send_replace(AuthState::from_session(session));
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> ClientResult<SessionDto> {
        let session = self.client.sign_in_with_password(email, password).await?;
        self.apply(Some(session.clone()));
        Ok(session)
    }

    pub async fn sign_out(&self) -> ClientResult<()> {
        let result = self.client.sign_out().await;
        self.apply(None);
        result
    }

    /// Explicit refresh, falling back to re-reading the current session
    pub async fn refresh_session(&self) -> ClientResult<Option<SessionDto>> {
        match self.client.refresh_session().await {
            Ok(session) => {
                self.apply(Some(session.clone()));
                Ok(Some(session))
            }
            Err(e) => {
                tracing::debug!(error = %e, "Refresh failed, re-reading session");
                let session = self.client.get_session().await?;
                self.apply(session.clone());
                Ok(session)
            }
        }
    }

    pub async fn get_aal_level(&self) -> ClientResult<AssuranceLevels> {
        self.client.get_assurance_level().await
    }

    pub async fn get_mfa_factors(&self) -> ClientResult<FactorListResponse> {
        self.client.list_factors().await
    }

    pub async fn enroll_mfa(&self, friendly_name: Option<&str>) -> ClientResult<EnrollResponse> {
        self.client.enroll_totp(friendly_name).await
    }

    pub async fn challenge_mfa(&self, factor_id: &FactorId) -> ClientResult<ChallengeResponse> {
        self.client.challenge(factor_id).await
    }

    /// Verify a code, then force a refresh so the new level is visible now
    pub async fn verify_mfa(
        &self,
        factor_id: &FactorId,
        challenge_id: &ChallengeId,
        code: &str,
    ) -> ClientResult<Option<SessionDto>> {
        let session = self.client.verify(factor_id, challenge_id, code).await?;
        self.apply(Some(session.clone()));

        match self.refresh_session().await {
            Ok(Some(refreshed)) => Ok(Some(refreshed)),
            Ok(None) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(error = %e, "Session refresh after MFA verification failed");
                Ok(Some(session))
            }
        }
    }

    pub async fn unenroll_mfa(&self, factor_id: &FactorId) -> ClientResult<UnenrollResponse> {
        self.client.unenroll(factor_id).await
    }
}

impl<C> Drop for AuthContext<C> {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::error::ClientError;
    use crate::client::noop::NoopClient;

    #[tokio::test]
    async fn test_init_without_backend() {
        let context = AuthContext::init(Arc::new(NoopClient::new())).await;
        let state = context.state();

        assert!(!state.loading);
        assert!(!state.is_authenticated());
        assert!(state.user.is_none());
    }

    #[tokio::test]
    async fn test_refresh_falls_back_to_session_read() {
        let context = AuthContext::init(Arc::new(NoopClient::new())).await;

        // Refresh is not configured, get_session answers None
        assert_eq!(context.refresh_session().await.unwrap(), None);
        assert!(matches!(
            context.get_aal_level().await,
            Err(ClientError::NotConfigured)
        ));
    }
}
