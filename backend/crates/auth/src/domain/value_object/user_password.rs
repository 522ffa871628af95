//! User Password Value Object
//!
//! Delegates hashing and policy checks to `platform::password`.
//! `RawPassword::new` enforces the policy (used when setting a password);
//! `RawPassword::for_verification` only normalizes (used on sign-in).

use kernel::error::app_error::{AppError, AppResult};
use platform::password::{
    ClearTextPassword, HashedPassword, PasswordHashError, PasswordPolicyError,
};
use std::fmt;

/// Admin password as typed, zeroized on drop
pub struct RawPassword(ClearTextPassword);

fn policy_violation(err: PasswordPolicyError) -> AppError {
    let (message, action) = match err {
        PasswordPolicyError::TooShort { min, .. } => (
            format!("Password must be at least {min} characters"),
            "Please choose a longer password",
        ),
        PasswordPolicyError::TooLong { max, .. } => (
            format!("Password must be at most {max} characters"),
            "Please choose a shorter password",
        ),
        PasswordPolicyError::EmptyOrWhitespace => (
            "Password cannot be empty".to_string(),
            "Please enter a password",
        ),
        PasswordPolicyError::InvalidCharacter => (
            "Password contains control characters".to_string(),
            "Please remove control characters",
        ),
        PasswordPolicyError::CommonPattern => (
            "Password is too easy to guess".to_string(),
            "Please choose a less predictable password",
        ),
    };
    AppError::bad_request(message).with_action(action)
}

impl RawPassword {
    /// Policy-checked; used when an admin password is set
    pub fn new(raw: String) -> AppResult<Self> {
        ClearTextPassword::new(raw)
            .map(Self)
            .map_err(policy_violation)
    }

    /// Normalized only; used on sign-in so older passwords keep working
    pub fn for_verification(raw: String) -> Self {
        Self(ClearTextPassword::for_verification(raw))
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

/// Argon2id PHC string, safe to persist
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AppResult<Self> {
        raw.inner().hash(pepper).map(Self).map_err(|e| match e {
            PasswordHashError::HashingFailed(msg) => {
                AppError::internal(format!("Password hashing failed: {msg}"))
            }
            PasswordHashError::InvalidHashFormat => AppError::internal("Password hashing failed"),
        })
    }

    pub fn from_phc_string(phc_string: impl Into<String>) -> AppResult<Self> {
        HashedPassword::from_phc_string(phc_string)
            .map(Self)
            .map_err(|_| AppError::internal("Stored password hash is malformed"))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// Constant-time verification; `pepper` must match the one used to hash
    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.inner(), pepper)
    }

    pub fn needs_rehash(&self) -> bool {
        self.0.needs_rehash()
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}
