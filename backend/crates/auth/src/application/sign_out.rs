//! Sign Out Use Case

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::AuthStore;
use crate::error::AuthResult;

pub struct SignOutUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> SignOutUseCase<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Delete the session behind an access token. Expired sessions can
    /// still be signed out.
    pub async fn execute(&self, access_token: &str) -> AuthResult<()> {
        let session_id = platform::token::verify(&self.config.session_secret, access_token)?;
        self.repo.delete_session(session_id).await?;

        tracing::info!(session_id = %session_id, "User signed out");
        Ok(())
    }
}
