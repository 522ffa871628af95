//! Seed Admin Use Case
//!
//! Creates the admin account at startup if it does not exist yet.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::{credentials::Credentials, user::User};
use crate::domain::repository::AuthStore;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::AuthResult;

pub struct SeedAdminInput {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

pub struct SeedAdminUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> SeedAdminUseCase<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Idempotent: an existing account is returned untouched
    pub async fn execute(&self, input: SeedAdminInput) -> AuthResult<User> {
        let email = Email::new(&input.email)?;

        if let Some(existing) = self.repo.find_user_by_email(&email).await? {
            tracing::debug!(user_id = %existing.user_id, "Admin account already present");
            return Ok(existing);
        }

        let raw = RawPassword::new(input.password)?;
        let hash = UserPassword::from_raw(&raw, self.config.pepper())?;

        let user = User::new(email, input.display_name);
        self.repo.create_user(&user).await?;
        self.repo
            .create_credentials(&Credentials::new(user.user_id, hash))
            .await?;

        tracing::info!(user_id = %user.user_id, email = %user.email, "Admin account seeded");
        Ok(user)
    }
}
