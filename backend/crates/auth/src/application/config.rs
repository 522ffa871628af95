//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use crate::domain::gate::GatePolicy;
use crate::error::{AuthError, AuthResult};

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;
use platform::cookie::CookieConfig;
use platform::rate_limit::RateLimitConfig;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Access token cookie name
    pub session_cookie_name: String,
    /// HMAC key for access tokens (32 bytes)
    pub session_secret: [u8; 32],
    /// Access token lifetime (1 hour)
    pub access_ttl: Duration,
    /// Refresh token lifetime (30 days)
    pub refresh_ttl: Duration,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Issuer label shown in authenticator apps
    pub totp_issuer: String,
    /// MFA challenge lifetime (5 minutes)
    pub challenge_ttl: Duration,
    pub gate: GatePolicy,
    /// How long the challenge flow waits for aal2 to become visible before
    /// redirecting anyway
    pub mfa_propagation_delay: Duration,
    /// TOTP verification attempts per user and factor (5 per 5 minutes)
    pub mfa_verify_limit: RateLimitConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "admin_session".to_string(),
            session_secret: [0u8; 32],
            access_ttl: Duration::from_secs(3600),
            refresh_ttl: Duration::from_secs(30 * 24 * 3600),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
            totp_issuer: "Despacho Admin".to_string(),
            challenge_ttl: Duration::from_secs(5 * 60),
            gate: GatePolicy::default(),
            mfa_propagation_delay: Duration::from_secs(1),
            mfa_verify_limit: RateLimitConfig::new(5, 5 * 60),
        }
    }
}

impl AuthConfig {
    /// Create config with a random session secret
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            session_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn access_ttl_chrono(&self) -> AuthResult<chrono::Duration> {
        to_chrono(self.access_ttl)
    }

    pub fn refresh_ttl_chrono(&self) -> AuthResult<chrono::Duration> {
        to_chrono(self.refresh_ttl)
    }

    pub fn challenge_ttl_chrono(&self) -> AuthResult<chrono::Duration> {
        to_chrono(self.challenge_ttl)
    }

    /// Cookie carrying the access token; lives as long as the access token
    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(self.access_ttl.as_secs()),
        }
    }
}

fn to_chrono(duration: Duration) -> AuthResult<chrono::Duration> {
    chrono::Duration::from_std(duration)
        .map_err(|e| AuthError::Internal(format!("Invalid duration: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_secret_differs() {
        let a = AuthConfig::with_random_secret();
        let b = AuthConfig::with_random_secret();
        assert_ne!(a.session_secret, b.session_secret);
        assert_ne!(a.session_secret, [0u8; 32]);
    }

    #[test]
    fn test_development_cookie() {
        let config = AuthConfig::development();
        let cookie = config.session_cookie();
        assert!(!cookie.secure);
        assert!(cookie.http_only);
        assert_eq!(cookie.max_age_secs, Some(3600));
        assert_eq!(config.access_ttl_chrono().unwrap(), chrono::Duration::hours(1));
    }
}
