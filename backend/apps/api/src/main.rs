//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.
//!
//! Without `DATABASE_URL` the server runs in demo mode: content comes from
//! the seeded in-memory mirror and auth state lives in memory.

mod config;

use std::net::SocketAddr;
use std::path::Path;

use auth::application::{SeedAdminInput, SeedAdminUseCase};
use auth::domain::repository::AuthStore;
use auth::{AuthAppState, MemoryAuthRepository, PgAuthRepository};
use axum::{
    Json, Router, http,
    http::{Method, header},
    middleware::from_fn_with_state,
    routing::get,
};
use content::domain::repository::ContentStore;
use content::{ContentAppState, MemoryContentRepository, PgContentRepository};
use platform::storage::{LocalDiskStorage, NoopStorage, ObjectStorage};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ApiConfig;

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,content=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;

    let Some(database_url) = config.database_url.clone() else {
        tracing::warn!("DATABASE_URL not set, serving the in-memory demo dataset");
        return launch(
            MemoryAuthRepository::new(),
            MemoryContentRepository::seeded(),
            config,
        )
        .await;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: remove expired sessions and challenges
    // Errors here should not prevent server startup
    let auth_repo = PgAuthRepository::new(pool.clone());
    if let Err(e) = auth_repo.cleanup_expired().await {
        tracing::warn!(
            error = %e,
            "Auth cleanup failed, continuing anyway"
        );
    }

    launch(auth_repo, PgContentRepository::new(pool), config).await
}

/// Seed the admin account, pick the image storage, then serve
async fn launch<A, C>(auth_repo: A, content_repo: C, config: ApiConfig) -> anyhow::Result<()>
where
    A: AuthStore,
    C: ContentStore,
{
    let auth_state = AuthAppState::new(auth_repo, config.auth.clone());

    match &config.admin_seed {
        Some(seed) => {
            let use_case = SeedAdminUseCase::new(auth_state.repo.clone(), auth_state.config.clone());
            use_case
                .execute(SeedAdminInput {
                    email: seed.email.clone(),
                    password: seed.password.clone(),
                    display_name: None,
                })
                .await?;
        }
        None if config.is_demo() => {
            tracing::warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set, the admin area has no account");
        }
        None => {}
    }

    match config.upload_dir.clone() {
        Some(dir) => {
            tokio::fs::create_dir_all(&dir).await?;
            tracing::info!(dir = %dir.display(), "Image uploads stored on local disk");
            let storage = LocalDiskStorage::new(&dir, config.upload_base_url.clone());
            serve(auth_state, content_repo, storage, Some(dir.as_path()), &config).await
        }
        None => {
            tracing::info!("UPLOAD_DIR not set, image uploads disabled");
            serve(auth_state, content_repo, NoopStorage, None, &config).await
        }
    }
}

async fn serve<A, C, S>(
    auth_state: AuthAppState<A>,
    content_repo: C,
    storage: S,
    upload_dir: Option<&Path>,
    config: &ApiConfig,
) -> anyhow::Result<()>
where
    A: AuthStore,
    C: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let content_state = ContentAppState::new(content_repo, storage, config.content.clone());

    let mut app = app(auth_state, content_state, config.is_demo());
    if let Some(dir) = upload_dir.filter(|_| config.upload_base_url.starts_with('/')) {
        app = app.nest_service(&config.upload_base_url, ServeDir::new(dir));
    }

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .expose_headers([
            header::LOCATION,
            header::HeaderName::from_static("x-auth-required"),
            header::HeaderName::from_static("x-mfa-required"),
        ])
        .allow_credentials(true);

    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // Start server
    let addr = config.bind_addr;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

/// `/api/auth`, public content under `/api`, gated admin under `/api/admin`
fn app<A, C, S>(
    auth_state: AuthAppState<A>,
    content_state: ContentAppState<C, S>,
    demo: bool,
) -> Router
where
    A: AuthStore,
    C: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let admin = content::admin_router(content_state.clone())
        .merge(auth::diagnostics_routes(auth_state.clone()))
        .layer(from_fn_with_state(
            auth_state.clone(),
            auth::require_admin_gate::<A>,
        ));

    let mode = if demo { "demo" } else { "postgres" };

    Router::new()
        .route(
            "/api/health",
            get(move || async move { Json(json!({ "status": "ok", "mode": mode })) }),
        )
        .nest("/api/auth", auth::auth_routes(auth_state))
        .nest("/api", content::public_router(content_state))
        .nest("/api/admin", admin)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
