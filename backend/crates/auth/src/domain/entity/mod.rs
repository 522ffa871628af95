//! Domain Entities

pub mod auth_session;
pub mod credentials;
pub mod mfa_challenge;
pub mod mfa_factor;
pub mod user;
