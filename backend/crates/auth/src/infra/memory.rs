//! In-memory repository used in demo mode and tests
//!
//! One `RwLock` per collection; clones share the same maps.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entity::{
    auth_session::AuthSession, credentials::Credentials, mfa_challenge::MfaChallenge,
    mfa_factor::MfaFactor, user::User,
};
use crate::domain::repository::{
    AuthSessionRepository, CredentialsRepository, MfaChallengeRepository, MfaFactorRepository,
    UserRepository,
};
use crate::domain::value_object::{
    email::Email,
    mfa::{ChallengeId, FactorId},
    user_id::UserId,
};
use crate::error::{AuthError, AuthResult};

#[derive(Clone, Default)]
pub struct MemoryAuthRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    credentials: Arc<RwLock<HashMap<UserId, Credentials>>>,
    sessions: Arc<RwLock<HashMap<Uuid, AuthSession>>>,
    factors: Arc<RwLock<HashMap<FactorId, MfaFactor>>>,
    challenges: Arc<RwLock<HashMap<ChallengeId, MfaChallenge>>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for MemoryAuthRepository {
    async fn create_user(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::EmailTaken);
        }
        users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> AuthResult<()> {
        match self.users.write().await.get_mut(&user.user_id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(AuthError::UserNotFound),
        }
    }
}

impl CredentialsRepository for MemoryAuthRepository {
    async fn create_credentials(&self, credentials: &Credentials) -> AuthResult<()> {
        self.credentials
            .write()
            .await
            .insert(credentials.user_id, credentials.clone());
        Ok(())
    }

    async fn find_credentials(&self, user_id: &UserId) -> AuthResult<Option<Credentials>> {
        Ok(self.credentials.read().await.get(user_id).cloned())
    }

    async fn update_credentials(&self, credentials: &Credentials) -> AuthResult<()> {
        match self.credentials.write().await.get_mut(&credentials.user_id) {
            Some(slot) => {
                *slot = credentials.clone();
                Ok(())
            }
            None => Err(AuthError::UserNotFound),
        }
    }
}

impl AuthSessionRepository for MemoryAuthRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<AuthSession>> {
        Ok(self.sessions.read().await.get(&session_id).cloned())
    }

    async fn find_session_by_refresh_hash(&self, hash: &[u8]) -> AuthResult<Option<AuthSession>> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .find(|s| platform::crypto::constant_time_eq(&s.refresh_token_hash, hash))
            .cloned())
    }

    async fn update_session(&self, session: &AuthSession) -> AuthResult<()> {
        match self.sessions.write().await.get_mut(&session.session_id) {
            Some(slot) => {
                *slot = session.clone();
                Ok(())
            }
            None => Err(AuthError::SessionInvalid),
        }
    }

    async fn touch_session(&self, session_id: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        if let Some(session) = self.sessions.write().await.get_mut(&session_id) {
            session.last_activity_at = at;
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()> {
        self.sessions.write().await.remove(&session_id);
        Ok(())
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_refresh_expired());
        Ok((before - sessions.len()) as u64)
    }
}

impl MfaFactorRepository for MemoryAuthRepository {
    async fn create_factor(&self, factor: &MfaFactor) -> AuthResult<()> {
        self.factors
            .write()
            .await
            .insert(factor.factor_id, factor.clone());
        Ok(())
    }

    async fn find_factor(&self, factor_id: &FactorId) -> AuthResult<Option<MfaFactor>> {
        Ok(self.factors.read().await.get(factor_id).cloned())
    }

    async fn list_factors(&self, user_id: &UserId) -> AuthResult<Vec<MfaFactor>> {
        let mut factors: Vec<MfaFactor> = self
            .factors
            .read()
            .await
            .values()
            .filter(|f| &f.user_id == user_id)
            .cloned()
            .collect();
        factors.sort_by_key(|f| (f.created_at, f.factor_id));
        Ok(factors)
    }

    async fn update_factor(&self, factor: &MfaFactor) -> AuthResult<()> {
        match self.factors.write().await.get_mut(&factor.factor_id) {
            Some(slot) => {
                *slot = factor.clone();
                Ok(())
            }
            None => Err(AuthError::FactorNotFound),
        }
    }

    async fn delete_factor(&self, factor_id: &FactorId) -> AuthResult<()> {
        self.factors.write().await.remove(factor_id);
        self.challenges
            .write()
            .await
            .retain(|_, c| &c.factor_id != factor_id);
        Ok(())
    }

    async fn delete_unverified_factors(&self, user_id: &UserId) -> AuthResult<u64> {
        let mut factors = self.factors.write().await;
        let before = factors.len();
        factors.retain(|_, f| &f.user_id != user_id || f.is_verified());
        Ok((before - factors.len()) as u64)
    }
}

impl MfaChallengeRepository for MemoryAuthRepository {
    async fn create_challenge(&self, challenge: &MfaChallenge) -> AuthResult<()> {
        self.challenges
            .write()
            .await
            .insert(challenge.challenge_id, challenge.clone());
        Ok(())
    }

    async fn find_challenge(&self, challenge_id: &ChallengeId) -> AuthResult<Option<MfaChallenge>> {
        Ok(self.challenges.read().await.get(challenge_id).cloned())
    }

    async fn update_challenge(&self, challenge: &MfaChallenge) -> AuthResult<()> {
        match self.challenges.write().await.get_mut(&challenge.challenge_id) {
            Some(slot) => {
                *slot = challenge.clone();
                Ok(())
            }
            None => Err(AuthError::ChallengeNotFound),
        }
    }

    async fn cleanup_expired_challenges(&self) -> AuthResult<u64> {
        let mut challenges = self.challenges.write().await;
        let before = challenges.len();
        challenges.retain(|_, c| !c.is_expired());
        Ok((before - challenges.len()) as u64)
    }
}
