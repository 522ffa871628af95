//! TOTP Secret Value Object
//!
//! RFC 6238 settings compatible with common authenticator apps:
//! SHA1, 6 digits, 30 second step, one step of skew.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use totp_rs::{Algorithm, Secret, TOTP};

const TOTP_DIGITS: usize = 6;
const TOTP_STEP: u64 = 30;
const TOTP_SKEW: u8 = 1;

#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TotpSecret {
    secret_base32: String,
}

impl TotpSecret {
    pub fn generate() -> Self {
        let secret = Secret::generate_secret();
        Self {
            secret_base32: secret.to_encoded().to_string(),
        }
    }

    /// Restore a stored secret, rejecting anything that is not valid base32
    pub fn from_base32(secret: impl Into<String>) -> AppResult<Self> {
        let secret_base32 = secret.into();
        Secret::Encoded(secret_base32.clone())
            .to_bytes()
            .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {}", e)))?;

        Ok(Self { secret_base32 })
    }

    pub fn as_base32(&self) -> &str {
        &self.secret_base32
    }

    fn to_totp(&self, issuer: &str, account_name: &str) -> AppResult<TOTP> {
        let bytes = Secret::Encoded(self.secret_base32.clone())
            .to_bytes()
            .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {}", e)))?;

        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP,
            bytes,
            Some(issuer.to_string()),
            account_name.to_string(),
        )
        .map_err(|e| AppError::internal(format!("Failed to create TOTP: {}", e)))
    }

    /// Check a six digit code against the current window
    pub fn verify(&self, code: &str, issuer: &str, account_name: &str) -> AppResult<bool> {
        let code = code.trim();
        if code.len() != TOTP_DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(false);
        }
        let totp = self.to_totp(issuer, account_name)?;
        Ok(totp.check_current(code).unwrap_or(false))
    }

    #[cfg(test)]
    pub fn generate_current(&self, issuer: &str, account_name: &str) -> AppResult<String> {
        let totp = self.to_totp(issuer, account_name)?;
        totp.generate_current()
            .map_err(|e| AppError::internal(format!("Failed to generate TOTP: {}", e)))
    }

    /// QR code as a `data:image/png;base64,...` URL, ready for an `<img src>`
    pub fn qr_data_url(&self, issuer: &str, account_name: &str) -> AppResult<String> {
        let totp = self.to_totp(issuer, account_name)?;
        let png = totp
            .get_qr_base64()
            .map_err(|e| AppError::internal(format!("Failed to generate QR code: {}", e)))?;
        Ok(format!("data:image/png;base64,{png}"))
    }

    /// `otpauth://` URI for manual entry
    pub fn otpauth_url(&self, issuer: &str, account_name: &str) -> AppResult<String> {
        let totp = self.to_totp(issuer, account_name)?;
        Ok(totp.get_url())
    }
}

impl std::fmt::Debug for TotpSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotpSecret").field("secret", &"[REDACTED]").finish()
    }
}
