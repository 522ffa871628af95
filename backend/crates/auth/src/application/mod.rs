//! Application Layer
//!
//! Use cases and application services.

pub mod check_gate;
pub mod check_session;
pub mod config;
pub mod mfa;
pub mod refresh_session;
pub mod seed_admin;
pub mod session;
pub mod sign_in;
pub mod sign_out;

// Re-exports
pub use check_gate::{CheckGateUseCase, GateCheck};
pub use check_session::{CheckSessionUseCase, SessionView};
pub use config::AuthConfig;
pub use mfa::{EnrollOutput, MfaUseCase, VerifyInput};
pub use refresh_session::RefreshSessionUseCase;
pub use seed_admin::{SeedAdminInput, SeedAdminUseCase};
pub use session::IssuedSession;
pub use sign_in::{SignInInput, SignInUseCase};
pub use sign_out::SignOutUseCase;
