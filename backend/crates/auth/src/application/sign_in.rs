//! Sign In Use Case
//!
//! Email + password sign-in. Always yields an aal1 session; reaching aal2
//! is the MFA flow's job.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session::{IssuedSession, new_refresh_token};
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::repository::AuthStore;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub struct SignInInput {
    pub email: String,
    pub password: String,
}

pub struct SignInUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> SignInUseCase<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<IssuedSession> {
        // Unknown and malformed emails look the same as a wrong password
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let mut user = self
            .repo
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let mut credentials = self
            .repo
            .find_credentials(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials not found".to_string()))?;

        if credentials.is_locked() {
            tracing::warn!(user_id = %user.user_id, "Sign-in attempt on locked account");
            return Err(AuthError::AccountLocked);
        }

        let raw = RawPassword::for_verification(input.password);
        if !credentials.password_hash.verify(&raw, self.config.pepper()) {
            credentials.record_failure();
            self.repo.update_credentials(&credentials).await?;
            tracing::warn!(
                user_id = %user.user_id,
                failed_count = credentials.failed_count,
                "Sign-in failed: wrong password"
            );
            return Err(AuthError::InvalidCredentials);
        }

        credentials.reset_failures();
        if credentials.password_hash.needs_rehash() {
            let rehashed = UserPassword::from_raw(&raw, self.config.pepper())?;
            credentials.update_password(rehashed);
        }
        self.repo.update_credentials(&credentials).await?;

        user.record_sign_in();
        self.repo.update_user(&user).await?;

        let (refresh_token, refresh_hash) = new_refresh_token();
        let session = AuthSession::new(
            user.user_id,
            refresh_hash,
            self.config.access_ttl_chrono()?,
            self.config.refresh_ttl_chrono()?,
        );
        self.repo.create_session(&session).await?;

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.session_id,
            "User signed in"
        );

        IssuedSession::new(&self.config, session, refresh_token, user)
    }
}
