//! Signed Session Tokens
//!
//! Format: `{uuid}.{base64url(hmac_sha256(secret, uuid))}`
//!
//! The token only proves that the server issued the id; whether the session
//! behind it is still alive is decided by the session store.

use thiserror::Error;
use uuid::Uuid;

use crate::crypto::{from_base64url, hmac_sha256, hmac_sha256_verify, to_base64url};

/// Token signing / verification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not of the form `id.signature`
    #[error("Malformed token")]
    Malformed,

    /// Signature does not match
    #[error("Invalid token signature")]
    BadSignature,

    /// Secret key rejected by HMAC
    #[error("Invalid signing key")]
    InvalidKey,
}

/// Sign an id with the session secret
pub fn sign(secret: &[u8; 32], id: &Uuid) -> Result<String, TokenError> {
    let id_str = id.to_string();
    let tag = hmac_sha256(secret, id_str.as_bytes()).map_err(|_| TokenError::InvalidKey)?;
    Ok(format!("{}.{}", id_str, to_base64url(&tag)))
}

/// Verify a signed token and return the id it carries
pub fn verify(secret: &[u8; 32], token: &str) -> Result<Uuid, TokenError> {
    let (id_str, signature_b64) = token.trim().split_once('.').ok_or(TokenError::Malformed)?;
    if signature_b64.contains('.') {
        return Err(TokenError::Malformed);
    }

    let signature = from_base64url(signature_b64).map_err(|_| TokenError::Malformed)?;
    if !hmac_sha256_verify(secret, id_str.as_bytes(), &signature) {
        return Err(TokenError::BadSignature);
    }

    id_str.parse().map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: [u8; 32] = [7u8; 32];

    #[test]
    fn test_sign_then_verify() {
        let id = Uuid::new_v4();
        let token = sign(&SECRET, &id).unwrap();
        assert!(token.starts_with(&id.to_string()));
        assert_eq!(verify(&SECRET, &token).unwrap(), id);
    }

    #[test]
    fn test_tampered_id_is_rejected() {
        let token = sign(&SECRET, &Uuid::new_v4()).unwrap();
        let (_, sig) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", Uuid::new_v4(), sig);
        assert_eq!(verify(&SECRET, &forged), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = sign(&SECRET, &Uuid::new_v4()).unwrap();
        assert_eq!(verify(&[8u8; 32], &token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_malformed_tokens() {
        assert_eq!(verify(&SECRET, ""), Err(TokenError::Malformed));
        assert_eq!(verify(&SECRET, "no-dot-here"), Err(TokenError::Malformed));
        assert_eq!(verify(&SECRET, "a.b.c"), Err(TokenError::Malformed));
        assert_eq!(verify(&SECRET, "abc.!!!"), Err(TokenError::Malformed));
    }
}
