//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer
//! (Postgres and in-memory). Method names are prefixed per aggregate so one
//! store can implement every trait without call-site ambiguity.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entity::{
    auth_session::AuthSession, credentials::Credentials, mfa_challenge::MfaChallenge,
    mfa_factor::MfaFactor, user::User,
};
use crate::domain::value_object::{
    email::Email,
    mfa::{ChallengeId, FactorId},
    user_id::UserId,
};
use crate::error::AuthResult;

#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    async fn create_user(&self, user: &User) -> AuthResult<()>;

    async fn find_user_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn update_user(&self, user: &User) -> AuthResult<()>;
}

#[trait_variant::make(CredentialsRepository: Send)]
pub trait LocalCredentialsRepository {
    async fn create_credentials(&self, credentials: &Credentials) -> AuthResult<()>;

    async fn find_credentials(&self, user_id: &UserId) -> AuthResult<Option<Credentials>>;

    async fn update_credentials(&self, credentials: &Credentials) -> AuthResult<()>;
}

#[trait_variant::make(AuthSessionRepository: Send)]
pub trait LocalAuthSessionRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()>;

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<AuthSession>>;

    /// Look up by SHA-256 of the refresh token
    async fn find_session_by_refresh_hash(&self, hash: &[u8]) -> AuthResult<Option<AuthSession>>;

    async fn update_session(&self, session: &AuthSession) -> AuthResult<()>;

    /// Record activity without touching level or tokens
    async fn touch_session(&self, session_id: Uuid, at: DateTime<Utc>) -> AuthResult<()>;

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()>;

    /// Remove sessions whose refresh window has closed
    async fn cleanup_expired_sessions(&self) -> AuthResult<u64>;
}

#[trait_variant::make(MfaFactorRepository: Send)]
pub trait LocalMfaFactorRepository {
    async fn create_factor(&self, factor: &MfaFactor) -> AuthResult<()>;

    async fn find_factor(&self, factor_id: &FactorId) -> AuthResult<Option<MfaFactor>>;

    /// Oldest first
    async fn list_factors(&self, user_id: &UserId) -> AuthResult<Vec<MfaFactor>>;

    async fn update_factor(&self, factor: &MfaFactor) -> AuthResult<()>;

    async fn delete_factor(&self, factor_id: &FactorId) -> AuthResult<()>;

    async fn delete_unverified_factors(&self, user_id: &UserId) -> AuthResult<u64>;
}

#[trait_variant::make(MfaChallengeRepository: Send)]
pub trait LocalMfaChallengeRepository {
    async fn create_challenge(&self, challenge: &MfaChallenge) -> AuthResult<()>;

    async fn find_challenge(&self, challenge_id: &ChallengeId) -> AuthResult<Option<MfaChallenge>>;

    async fn update_challenge(&self, challenge: &MfaChallenge) -> AuthResult<()>;

    async fn cleanup_expired_challenges(&self) -> AuthResult<u64>;
}

/// Everything the auth use cases need from one store
pub trait AuthStore:
    UserRepository
    + CredentialsRepository
    + AuthSessionRepository
    + MfaFactorRepository
    + MfaChallengeRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthStore for T where
    T: UserRepository
        + CredentialsRepository
        + AuthSessionRepository
        + MfaFactorRepository
        + MfaChallengeRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
