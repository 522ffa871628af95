//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, AAL gate decision
//! - `application/` - Use cases and application services
//! - `infra/` - Postgres and in-memory repositories
//! - `presentation/` - HTTP handlers, DTOs, router, admin gate middleware
//! - `client/` - Backend Service Client, reactive auth context, client-side gate
//!
//! ## Features
//! - Email + password sign-in for admin users, refresh-token rotation
//! - TOTP multi-factor authentication (Google Authenticator compatible)
//! - Authenticator assurance levels (`aal1` / `aal2`)
//! - One gate decision used at the request boundary and in the client
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional pepper
//! - Access tokens are HMAC-signed session ids; refresh tokens stored hashed
//! - Lockout after repeated failed sign-ins
//! - Users with a verified factor must reach `aal2` to use the admin area

pub mod application;
pub mod client;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::{memory::MemoryAuthRepository, postgres::PgAuthRepository};
pub use presentation::{
    AuthAppState, auth_router, auth_router_generic, auth_routes, diagnostics_routes,
    require_admin_gate,
};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
