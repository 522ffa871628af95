//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
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
    aal::Aal,
    email::Email,
    mfa::{ChallengeId, FactorId, FactorStatus, FactorType},
    totp_secret::TotpSecret,
    user_id::UserId,
    user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clean up expired sessions and challenges
    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        let sessions = self.cleanup_expired_sessions().await?;
        let challenges = self.cleanup_expired_challenges().await?;

        tracing::info!(
            sessions_deleted = sessions,
            challenges_deleted = challenges,
            "Cleaned up expired auth state"
        );

        Ok(sessions + challenges)
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create_user(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                display_name,
                last_sign_in_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(&user.display_name)
        .bind(user.last_sign_in_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AuthError::EmailTaken,
            other => AuthError::Database(other),
        })?;

        Ok(())
    }

    async fn find_user_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, email, display_name, last_sign_in_at, created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, email, display_name, last_sign_in_at, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn update_user(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                display_name = $3,
                last_sign_in_at = $4,
                updated_at = $5
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(&user.display_name)
        .bind(user.last_sign_in_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Credentials Repository Implementation
// ============================================================================

impl CredentialsRepository for PgAuthRepository {
    async fn create_credentials(&self, credentials: &Credentials) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_credentials (
                user_id,
                password_hash,
                failed_count,
                last_failed_at,
                locked_until,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(credentials.user_id.as_uuid())
        .bind(credentials.password_hash.as_phc_string())
        .bind(credentials.failed_count as i16)
        .bind(credentials.last_failed_at)
        .bind(credentials.locked_until)
        .bind(credentials.created_at)
        .bind(credentials.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_credentials(&self, user_id: &UserId) -> AuthResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT
                user_id,
                password_hash,
                failed_count,
                last_failed_at,
                locked_until,
                created_at,
                updated_at
            FROM auth_credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CredentialsRow::into_credentials).transpose()
    }

    async fn update_credentials(&self, credentials: &Credentials) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_credentials SET
                password_hash = $2,
                failed_count = $3,
                last_failed_at = $4,
                locked_until = $5,
                updated_at = $6
            WHERE user_id = $1
            "#,
        )
        .bind(credentials.user_id.as_uuid())
        .bind(credentials.password_hash.as_phc_string())
        .bind(credentials.failed_count as i16)
        .bind(credentials.last_failed_at)
        .bind(credentials.locked_until)
        .bind(credentials.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Auth Session Repository Implementation
// ============================================================================

impl AuthSessionRepository for PgAuthRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                user_id,
                aal,
                refresh_token_hash,
                expires_at_ms,
                refresh_expires_at_ms,
                created_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id.as_uuid())
        .bind(session.aal.as_str())
        .bind(&session.refresh_token_hash)
        .bind(session.expires_at_ms)
        .bind(session.refresh_expires_at_ms)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<AuthSession>> {
        let row = sqlx::query_as::<_, AuthSessionRow>(
            r#"
            SELECT
                session_id,
                user_id,
                aal,
                refresh_token_hash,
                expires_at_ms,
                refresh_expires_at_ms,
                created_at,
                last_activity_at
            FROM auth_sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AuthSessionRow::into_session).transpose()
    }

    async fn find_session_by_refresh_hash(&self, hash: &[u8]) -> AuthResult<Option<AuthSession>> {
        let row = sqlx::query_as::<_, AuthSessionRow>(
            r#"
            SELECT
                session_id,
                user_id,
                aal,
                refresh_token_hash,
                expires_at_ms,
                refresh_expires_at_ms,
                created_at,
                last_activity_at
            FROM auth_sessions
            WHERE refresh_token_hash = $1
            "#,
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AuthSessionRow::into_session).transpose()
    }

    async fn update_session(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_sessions SET
                aal = $2,
                refresh_token_hash = $3,
                expires_at_ms = $4,
                last_activity_at = $5
            WHERE session_id = $1
            "#,
        )
        .bind(session.session_id)
        .bind(session.aal.as_str())
        .bind(&session.refresh_token_hash)
        .bind(session.expires_at_ms)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn touch_session(&self, session_id: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE auth_sessions SET last_activity_at = $2 WHERE session_id = $1")
            .bind(session_id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE refresh_expires_at_ms < $1")
            .bind(Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// MFA Factor Repository Implementation
// ============================================================================

impl MfaFactorRepository for PgAuthRepository {
    async fn create_factor(&self, factor: &MfaFactor) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO mfa_factors (
                factor_id,
                user_id,
                factor_type,
                friendly_name,
                secret,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(factor.factor_id.as_uuid())
        .bind(factor.user_id.as_uuid())
        .bind(factor.factor_type.as_str())
        .bind(&factor.friendly_name)
        .bind(factor.secret.as_base32())
        .bind(factor.status.as_str())
        .bind(factor.created_at)
        .bind(factor.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_factor(&self, factor_id: &FactorId) -> AuthResult<Option<MfaFactor>> {
        let row = sqlx::query_as::<_, MfaFactorRow>(
            r#"
            SELECT
                factor_id,
                user_id,
                factor_type,
                friendly_name,
                secret,
                status,
                created_at,
                updated_at
            FROM mfa_factors
            WHERE factor_id = $1
            "#,
        )
        .bind(factor_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(MfaFactorRow::into_factor).transpose()
    }

    async fn list_factors(&self, user_id: &UserId) -> AuthResult<Vec<MfaFactor>> {
        let rows = sqlx::query_as::<_, MfaFactorRow>(
            r#"
            SELECT
                factor_id,
                user_id,
                factor_type,
                friendly_name,
                secret,
                status,
                created_at,
                updated_at
            FROM mfa_factors
            WHERE user_id = $1
            ORDER BY created_at ASC, factor_id ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MfaFactorRow::into_factor).collect()
    }

    async fn update_factor(&self, factor: &MfaFactor) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE mfa_factors SET
                friendly_name = $2,
                status = $3,
                updated_at = $4
            WHERE factor_id = $1
            "#,
        )
        .bind(factor.factor_id.as_uuid())
        .bind(&factor.friendly_name)
        .bind(factor.status.as_str())
        .bind(factor.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_factor(&self, factor_id: &FactorId) -> AuthResult<()> {
        // mfa_challenges cascade
        sqlx::query("DELETE FROM mfa_factors WHERE factor_id = $1")
            .bind(factor_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_unverified_factors(&self, user_id: &UserId) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM mfa_factors WHERE user_id = $1 AND status = $2")
            .bind(user_id.as_uuid())
            .bind(FactorStatus::Unverified.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// MFA Challenge Repository Implementation
// ============================================================================

impl MfaChallengeRepository for PgAuthRepository {
    async fn create_challenge(&self, challenge: &MfaChallenge) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO mfa_challenges (
                challenge_id,
                factor_id,
                user_id,
                created_at,
                expires_at_ms,
                verified_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(challenge.challenge_id.as_uuid())
        .bind(challenge.factor_id.as_uuid())
        .bind(challenge.user_id.as_uuid())
        .bind(challenge.created_at)
        .bind(challenge.expires_at_ms)
        .bind(challenge.verified_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_challenge(&self, challenge_id: &ChallengeId) -> AuthResult<Option<MfaChallenge>> {
        let row = sqlx::query_as::<_, MfaChallengeRow>(
            r#"
            SELECT challenge_id, factor_id, user_id, created_at, expires_at_ms, verified_at
            FROM mfa_challenges
            WHERE challenge_id = $1
            "#,
        )
        .bind(challenge_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MfaChallengeRow::into_challenge))
    }

    async fn update_challenge(&self, challenge: &MfaChallenge) -> AuthResult<()> {
        sqlx::query("UPDATE mfa_challenges SET verified_at = $2 WHERE challenge_id = $1")
            .bind(challenge.challenge_id.as_uuid())
            .bind(challenge.verified_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired_challenges(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM mfa_challenges WHERE expires_at_ms < $1")
            .bind(Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    display_name: Option<String>,
    last_sign_in_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            display_name: self.display_name,
            last_sign_in_at: self.last_sign_in_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    user_id: Uuid,
    password_hash: String,
    failed_count: i16,
    last_failed_at: Option<DateTime<Utc>>,
    locked_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CredentialsRow {
    fn into_credentials(self) -> AuthResult<Credentials> {
        Ok(Credentials {
            user_id: UserId::from_uuid(self.user_id),
            password_hash: UserPassword::from_phc_string(self.password_hash)?,
            failed_count: self.failed_count.max(0) as u16,
            last_failed_at: self.last_failed_at,
            locked_until: self.locked_until,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    user_id: Uuid,
    aal: String,
    refresh_token_hash: Vec<u8>,
    expires_at_ms: i64,
    refresh_expires_at_ms: i64,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AuthResult<AuthSession> {
        let aal: Aal = self
            .aal
            .parse()
            .map_err(|_| AuthError::Internal(format!("Invalid aal in database: {}", self.aal)))?;

        Ok(AuthSession {
            session_id: self.session_id,
            user_id: UserId::from_uuid(self.user_id),
            aal,
            refresh_token_hash: self.refresh_token_hash,
            expires_at_ms: self.expires_at_ms,
            refresh_expires_at_ms: self.refresh_expires_at_ms,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MfaFactorRow {
    factor_id: Uuid,
    user_id: Uuid,
    factor_type: String,
    friendly_name: Option<String>,
    secret: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MfaFactorRow {
    fn into_factor(self) -> AuthResult<MfaFactor> {
        let factor_type: FactorType = self.factor_type.parse()?;
        let status: FactorStatus = self.status.parse()?;

        Ok(MfaFactor {
            factor_id: FactorId::from_uuid(self.factor_id),
            user_id: UserId::from_uuid(self.user_id),
            factor_type,
            friendly_name: self.friendly_name,
            secret: TotpSecret::from_base32(self.secret)?,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MfaChallengeRow {
    challenge_id: Uuid,
    factor_id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at_ms: i64,
    verified_at: Option<DateTime<Utc>>,
}

impl MfaChallengeRow {
    fn into_challenge(self) -> MfaChallenge {
        MfaChallenge {
            challenge_id: ChallengeId::from_uuid(self.challenge_id),
            factor_id: FactorId::from_uuid(self.factor_id),
            user_id: UserId::from_uuid(self.user_id),
            created_at: self.created_at,
            expires_at_ms: self.expires_at_ms,
            verified_at: self.verified_at,
        }
    }
}
