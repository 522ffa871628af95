//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};

use crate::application::config::AuthConfig;
use crate::domain::repository::AuthStore;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(repo: PgAuthRepository, config: AuthConfig) -> Router {
    auth_router_generic(repo, config)
}

/// Create a generic Auth router for any repository implementation
pub fn auth_router_generic<R>(repo: R, config: AuthConfig) -> Router
where
    R: AuthStore,
{
    auth_routes(AuthAppState::new(repo, config))
}

/// Auth routes over an existing state (shared with the admin gate)
pub fn auth_routes<R>(state: AuthAppState<R>) -> Router
where
    R: AuthStore,
{
    Router::new()
        .route("/signin", post(handlers::sign_in::<R>))
        .route("/signout", post(handlers::sign_out::<R>))
        .route("/refresh", post(handlers::refresh::<R>))
        .route("/session", get(handlers::session::<R>))
        .route("/mfa/factors", get(handlers::list_factors::<R>))
        .route("/mfa/enroll", post(handlers::enroll::<R>))
        .route("/mfa/challenge", post(handlers::challenge::<R>))
        .route("/mfa/verify", post(handlers::verify::<R>))
        .route("/mfa/unenroll", post(handlers::unenroll::<R>))
        .route("/mfa/aal", get(handlers::assurance_level::<R>))
        .with_state(state)
}

/// `GET /diagnostics/auth`, meant to be nested under the gated admin router
pub fn diagnostics_routes<R>(state: AuthAppState<R>) -> Router
where
    R: AuthStore,
{
    Router::new()
        .route("/diagnostics/auth", get(handlers::auth_diagnostics::<R>))
        .with_state(state)
}
