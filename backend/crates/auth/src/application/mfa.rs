//! MFA Use Case
//!
//! TOTP enrollment, challenge/verify and unenrollment for the owner of an
//! authenticated session. Every method takes the session freshly resolved
//! by `CheckSessionUseCase`.
//!
//! Verification attempts are counted per user and factor, across
//! challenges, and cut off at `AuthConfig::mfa_verify_limit`.

use std::sync::Arc;

use platform::rate_limit::{MemoryRateLimitStore, RateLimitStore, now_ms};

use crate::application::config::AuthConfig;
use crate::application::session::{IssuedSession, new_refresh_token};
use crate::domain::entity::{
    auth_session::AuthSession, mfa_challenge::MfaChallenge, mfa_factor::MfaFactor, user::User,
};
use crate::domain::gate::has_verified_factor;
use crate::domain::repository::AuthStore;
use crate::domain::value_object::{
    aal::{Aal, AssuranceLevels},
    mfa::{ChallengeId, FactorId},
};
use crate::error::{AuthError, AuthResult};

const FRIENDLY_NAME_MAX: usize = 64;

/// Freshly enrolled factor plus what the authenticator app needs
pub struct EnrollOutput {
    pub factor: MfaFactor,
    /// `data:image/png;base64,...`
    pub qr_code: String,
    pub secret: String,
    pub uri: String,
}

pub struct VerifyInput {
    pub factor_id: FactorId,
    pub challenge_id: ChallengeId,
    pub code: String,
}

pub struct MfaUseCase<R, L = MemoryRateLimitStore>
where
    R: AuthStore,
    L: RateLimitStore + Sync + 'static,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    limiter: Arc<L>,
}

impl<R, L> MfaUseCase<R, L>
where
    R: AuthStore,
    L: RateLimitStore + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>, limiter: Arc<L>) -> Self {
        Self {
            repo,
            config,
            limiter,
        }
    }

    pub async fn list_factors(&self, session: &AuthSession) -> AuthResult<Vec<MfaFactor>> {
        self.repo.list_factors(&session.user_id).await
    }

    /// Start a TOTP enrollment. Earlier unfinished enrollments are dropped.
    pub async fn enroll(
        &self,
        session: &AuthSession,
        friendly_name: Option<String>,
    ) -> AuthResult<EnrollOutput> {
        let friendly_name = friendly_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if friendly_name
            .as_ref()
            .is_some_and(|n| n.chars().count() > FRIENDLY_NAME_MAX)
        {
            return Err(AuthError::Validation(format!(
                "Factor name must be at most {FRIENDLY_NAME_MAX} characters"
            )));
        }

        let user = self.user(session).await?;

        let removed = self.repo.delete_unverified_factors(&user.user_id).await?;
        if removed > 0 {
            tracing::debug!(user_id = %user.user_id, removed, "Dropped stale MFA enrollments");
        }

        let factor = MfaFactor::enroll_totp(user.user_id, friendly_name);
        let issuer = &self.config.totp_issuer;
        let account = user.email.as_str();
        let qr_code = factor.secret.qr_data_url(issuer, account)?;
        let uri = factor.secret.otpauth_url(issuer, account)?;
        let secret = factor.secret.as_base32().to_string();

        self.repo.create_factor(&factor).await?;

        tracing::info!(
            user_id = %user.user_id,
            factor_id = %factor.factor_id,
            "TOTP factor enrolled"
        );

        Ok(EnrollOutput {
            factor,
            qr_code,
            secret,
            uri,
        })
    }

    pub async fn challenge(
        &self,
        session: &AuthSession,
        factor_id: &FactorId,
    ) -> AuthResult<MfaChallenge> {
        let factor = self.owned_factor(session, factor_id).await?;

        let challenge = MfaChallenge::new(
            factor.factor_id,
            session.user_id,
            self.config.challenge_ttl_chrono()?,
        );
        self.repo.create_challenge(&challenge).await?;

        tracing::debug!(
            factor_id = %factor.factor_id,
            challenge_id = %challenge.challenge_id,
            "MFA challenge created"
        );
        Ok(challenge)
    }

    /// Check a code. On success the factor becomes verified, the session
    /// reaches aal2 and its refresh token is rotated.
    ///
    /// A wrong code leaves the challenge usable for another attempt until
    /// the attempt limit for the factor is reached.
    pub async fn verify(
        &self,
        session: &AuthSession,
        input: VerifyInput,
    ) -> AuthResult<IssuedSession> {
        let mut challenge = self
            .repo
            .find_challenge(&input.challenge_id)
            .await?
            .filter(|c| c.factor_id == input.factor_id && c.user_id == session.user_id)
            .ok_or(AuthError::ChallengeNotFound)?;

        if challenge.is_used() {
            return Err(AuthError::ChallengeAlreadyUsed);
        }
        if challenge.is_expired() {
            return Err(AuthError::ChallengeExpired);
        }

        let mut factor = self.owned_factor(session, &input.factor_id).await?;
        let user = self.user(session).await?;

        let limit_key = format!("mfa_verify:{}:{}", user.user_id, factor.factor_id);
        let attempt = self
            .limiter
            .check_and_increment(&limit_key, &self.config.mfa_verify_limit)
            .await?;
        if !attempt.allowed {
            return Err(AuthError::TooManyAttempts {
                retry_after_secs: attempt.retry_after_secs(now_ms()),
            });
        }

        let valid =
            factor
                .secret
                .verify(&input.code, &self.config.totp_issuer, user.email.as_str())?;
        if !valid {
            tracing::warn!(
                user_id = %user.user_id,
                challenge_id = %challenge.challenge_id,
                remaining = attempt.remaining,
                "Invalid MFA code"
            );
            return Err(AuthError::InvalidCode);
        }

        challenge.mark_verified();
        self.repo.update_challenge(&challenge).await?;
        self.limiter.reset(&limit_key).await?;

        if !factor.is_verified() {
            factor.mark_verified();
            self.repo.update_factor(&factor).await?;
        }

        let mut session = session.clone();
        let (refresh_token, refresh_hash) = new_refresh_token();
        session.elevate();
        session.rotate(refresh_hash, self.config.access_ttl_chrono()?);
        self.repo.update_session(&session).await?;

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.session_id,
            "MFA verified; session elevated to aal2"
        );

        IssuedSession::new(&self.config, session, refresh_token, user)
    }

    /// Remove a factor. Removing a verified factor needs an aal2 session.
    pub async fn unenroll(&self, session: &AuthSession, factor_id: &FactorId) -> AuthResult<()> {
        let factor = self.owned_factor(session, factor_id).await?;

        if factor.is_verified() && session.aal != Aal::Aal2 {
            return Err(AuthError::InsufficientAal);
        }

        self.repo.delete_factor(&factor.factor_id).await?;

        tracing::info!(
            user_id = %session.user_id,
            factor_id = %factor.factor_id,
            "MFA factor removed"
        );
        Ok(())
    }

    pub async fn assurance_level(&self, session: &AuthSession) -> AuthResult<AssuranceLevels> {
        let factors = self.repo.list_factors(&session.user_id).await?;
        Ok(AssuranceLevels::new(session.aal, has_verified_factor(&factors)))
    }

    async fn owned_factor(
        &self,
        session: &AuthSession,
        factor_id: &FactorId,
    ) -> AuthResult<MfaFactor> {
        self.repo
            .find_factor(factor_id)
            .await?
            .filter(|f| f.user_id == session.user_id)
            .ok_or(AuthError::FactorNotFound)
    }

    async fn user(&self, session: &AuthSession) -> AuthResult<User> {
        self.repo
            .find_user_by_id(&session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
