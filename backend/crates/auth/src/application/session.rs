//! Session issuing shared by sign-in, refresh and MFA verification

use crate::application::config::AuthConfig;
use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::error::AuthResult;

/// Refresh tokens are 32 random bytes, base64url encoded
const REFRESH_TOKEN_BYTES: usize = 32;

/// A session together with the credentials handed to the client
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub access_token: String,
    /// Plaintext; only its hash is stored
    pub refresh_token: String,
    pub session: AuthSession,
    pub user: User,
}

impl IssuedSession {
    pub fn new(
        config: &AuthConfig,
        session: AuthSession,
        refresh_token: String,
        user: User,
    ) -> AuthResult<Self> {
        let access_token = platform::token::sign(&config.session_secret, &session.session_id)?;
        Ok(Self {
            access_token,
            refresh_token,
            session,
            user,
        })
    }
}

/// New refresh token and the hash to persist
pub fn new_refresh_token() -> (String, Vec<u8>) {
    let token = platform::crypto::random_token(REFRESH_TOKEN_BYTES);
    let hash = hash_refresh_token(&token);
    (token, hash)
}

pub fn hash_refresh_token(token: &str) -> Vec<u8> {
    platform::crypto::sha256(token.as_bytes()).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_token_hash() {
        let (token, hash) = new_refresh_token();
        assert_eq!(hash, hash_refresh_token(&token));
        assert_eq!(hash.len(), 32);

        let (other, _) = new_refresh_token();
        assert_ne!(token, other);
    }
}
