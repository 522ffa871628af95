//! Content Routers
//!
//! `public_router` is mounted under `/api`; `admin_router` under
//! `/api/admin`, behind the auth gate.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
};
use platform::storage::{MAX_OBJECT_BYTES, ObjectStorage};

use crate::domain::repository::ContentStore;
use crate::presentation::handlers::{self, ContentAppState};

/// Room for request framing on top of the largest accepted image
const UPLOAD_BODY_LIMIT: usize = MAX_OBJECT_BYTES + 64 * 1024;

/// Read-only routes; posts are always filtered to PUBLIC
pub fn public_router<R, S>(state: ContentAppState<R, S>) -> Router
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    Router::new()
        .route("/posts", get(handlers::list_public_posts::<R, S>))
        .route("/posts/latest", get(handlers::latest_posts::<R, S>))
        .route("/posts/slug/{slug}", get(handlers::get_post_by_slug::<R, S>))
        .route("/posts/{id}", get(handlers::get_public_post::<R, S>))
        .route(
            "/posts/{id}/recommended",
            get(handlers::recommended_posts::<R, S>),
        )
        .route("/categories", get(handlers::list_categories::<R, S>))
        .route(
            "/categories/{slug}/posts",
            get(handlers::posts_by_category_slug::<R, S>),
        )
        .route("/authors", get(handlers::list_authors::<R, S>))
        .route("/authors/{id}", get(handlers::get_author::<R, S>))
        .with_state(state)
}

/// Full CRUD over posts, categories, authors and images
pub fn admin_router<R, S>(state: ContentAppState<R, S>) -> Router
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/posts",
            get(handlers::list_all_posts::<R, S>).post(handlers::create_post::<R, S>),
        )
        .route(
            "/posts/{id}",
            get(handlers::get_any_post::<R, S>)
                .patch(handlers::update_post::<R, S>)
                .delete(handlers::delete_post::<R, S>),
        )
        .route("/categories", post(handlers::create_category::<R, S>))
        .route(
            "/categories/{id}",
            patch(handlers::update_category::<R, S>).delete(handlers::delete_category::<R, S>),
        )
        .route("/authors", post(handlers::create_author::<R, S>))
        .route(
            "/authors/{id}",
            patch(handlers::update_author::<R, S>).delete(handlers::delete_author::<R, S>),
        )
        .route(
            "/images",
            post(handlers::upload_image::<R, S>).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/images/{*key}", delete(handlers::remove_image::<R, S>))
        .with_state(state)
}
