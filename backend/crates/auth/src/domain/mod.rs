//! Domain Layer
//!
//! Entities, value objects, repository traits and the AAL gate decision.

pub mod entity;
pub mod gate;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    auth_session::AuthSession, credentials::Credentials, mfa_challenge::MfaChallenge,
    mfa_factor::MfaFactor, user::User,
};
pub use gate::{
    GateFactor, GateOutcome, GatePolicy, GateState, Verdict, decide, has_verified_factor,
};
pub use repository::{
    AuthSessionRepository, AuthStore, CredentialsRepository, MfaChallengeRepository,
    MfaFactorRepository, UserRepository,
};
