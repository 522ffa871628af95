//! Check Session Use Case
//!
//! Resolves an access token to a live session and its user.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::repository::AuthStore;
use crate::error::{AuthError, AuthResult};

/// Session with its user, as seen by one request
#[derive(Debug, Clone)]
pub struct SessionView {
    pub session: AuthSession,
    pub user: User,
}

pub struct CheckSessionUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> CheckSessionUseCase<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, access_token: &str) -> AuthResult<SessionView> {
        let session = self.get_session(access_token).await?;
        let user = self
            .repo
            .find_user_by_id(&session.user_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;
        Ok(SessionView { session, user })
    }

    pub async fn is_valid(&self, access_token: &str) -> bool {
        self.get_session(access_token).await.is_ok()
    }

    /// Verify the token, load the session and record activity
    pub async fn get_session(&self, access_token: &str) -> AuthResult<AuthSession> {
        let session_id = platform::token::verify(&self.config.session_secret, access_token)?;

        let mut session = self
            .repo
            .find_session(session_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        if session.is_refresh_expired() {
            self.repo.delete_session(session_id).await?;
            return Err(AuthError::SessionInvalid);
        }
        // Access expiry alone keeps the row; the refresh token can renew it
        if session.is_expired() {
            return Err(AuthError::SessionInvalid);
        }

        session.touch();

        // Update in background
        let (id, at) = (session.session_id, session.last_activity_at);
        let repo = self.repo.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.touch_session(id, at).await {
                tracing::warn!(error = %e, "Failed to update session activity");
            }
        });

        Ok(session)
    }
}
