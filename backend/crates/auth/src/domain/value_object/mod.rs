//! Value Object Module

pub mod aal;
pub mod email;
pub mod mfa;
pub mod totp_secret;
pub mod user_id;
pub mod user_password;
