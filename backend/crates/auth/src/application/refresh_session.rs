//! Refresh Session Use Case
//!
//! Trades a refresh token for a renewed access window. Every call rotates
//! the refresh token, so a token works exactly once.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session::{IssuedSession, hash_refresh_token, new_refresh_token};
use crate::domain::repository::AuthStore;
use crate::error::{AuthError, AuthResult};

pub struct RefreshSessionUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> RefreshSessionUseCase<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, refresh_token: &str) -> AuthResult<IssuedSession> {
        let hash = hash_refresh_token(refresh_token.trim());

        let mut session = self
            .repo
            .find_session_by_refresh_hash(&hash)
            .await?
            .ok_or(AuthError::RefreshTokenInvalid)?;

        if session.is_refresh_expired() {
            self.repo.delete_session(session.session_id).await?;
            return Err(AuthError::RefreshTokenInvalid);
        }

        let user = self
            .repo
            .find_user_by_id(&session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let (new_token, new_hash) = new_refresh_token();
        session.rotate(new_hash, self.config.access_ttl_chrono()?);
        self.repo.update_session(&session).await?;

        tracing::debug!(
            session_id = %session.session_id,
            aal = %session.aal,
            "Session refreshed"
        );

        IssuedSession::new(&self.config, session, new_token, user)
    }
}
