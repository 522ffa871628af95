//! HTTP Handlers
//!
//! Public handlers only ever expose PUBLIC posts. Admin handlers sit behind
//! the auth gate and see every visibility.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use platform::storage::ObjectStorage;

use crate::application::{
    AuthorsUseCase, CategoriesUseCase, ContentConfig, ImagesUseCase, ReadPostsUseCase,
    WritePostsUseCase,
};
use crate::domain::entity::{Author, Category, PostWithRelations};
use crate::domain::query::PostPage;
use crate::domain::repository::ContentStore;
use crate::domain::value_object::{AuthorId, CategoryId, PostId, VisibilityFilter};
use crate::error::{ContentError, ContentResult};
use crate::presentation::dto::{
    CategoryRequest, CreateAuthorRequest, CreatePostRequest, ImageResponse, LatestParams,
    LimitParams, ListPostsParams, UpdateAuthorRequest, UpdatePostRequest,
};

/// Shared state for content handlers
pub struct ContentAppState<R, S>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub storage: Arc<S>,
    pub config: Arc<ContentConfig>,
}

impl<R, S> Clone for ContentAppState<R, S>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            storage: self.storage.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, S> ContentAppState<R, S>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    pub fn new(repo: R, storage: S, config: ContentConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            storage: Arc::new(storage),
            config: Arc::new(config),
        }
    }

    fn reads(&self) -> ReadPostsUseCase<R> {
        ReadPostsUseCase::new(self.repo.clone(), self.config.clone())
    }

    fn writes(&self) -> WritePostsUseCase<R> {
        WritePostsUseCase::new(self.repo.clone(), self.config.clone())
    }
}

fn parse_id<T>(raw: &str) -> ContentResult<kernel::id::Id<T>> {
    Ok(kernel::id::Id::parse_str(raw)?)
}

async fn list<R, S>(
    state: &ContentAppState<R, S>,
    params: &ListPostsParams,
    visibility: VisibilityFilter,
) -> ContentResult<PostPage>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let category = params.category()?;
    let page = params.page(&state.config)?;
    let reads = state.reads();

    Ok(match params.search_term() {
        Some(term) => {
            reads
                .search_posts_with_pagination(term, visibility, category, page)
                .await
        }
        None => {
            reads
                .fetch_posts_including_uncategorized_with_pagination(visibility, category, page)
                .await
        }
    })
}

// ============================================================================
// Public posts
// ============================================================================

/// GET /api/posts
pub async fn list_public_posts<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Query(params): Query<ListPostsParams>,
) -> ContentResult<Json<PostPage>>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    Ok(Json(list(&state, &params, VisibilityFilter::Public).await?))
}

/// GET /api/posts/latest
pub async fn latest_posts<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Query(params): Query<LatestParams>,
) -> Json<Vec<PostWithRelations>>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let limit = state
        .config
        .clamp_limit(params.limit, state.config.default_latest);
    Json(
        state
            .reads()
            .fetch_latest_posts(limit, params.exclude_id)
            .await,
    )
}

/// GET /api/posts/{id}
///
/// An id reaches a post of any visibility; only the slug route is
/// restricted to PUBLIC posts.
pub async fn get_public_post<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Path(id): Path<String>,
) -> ContentResult<Json<PostWithRelations>>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let id: PostId = parse_id(&id)?;
    state
        .reads()
        .fetch_post_by_id(&id)
        .await
        .map(Json)
        .ok_or(ContentError::PostNotFound)
}

/// GET /api/posts/{id}/recommended
pub async fn recommended_posts<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Path(id): Path<String>,
    Query(params): Query<LimitParams>,
) -> ContentResult<Json<Vec<PostWithRelations>>>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let id: PostId = parse_id(&id)?;
    let limit = state
        .config
        .clamp_limit(params.limit, state.config.default_recommended);
    Ok(Json(
        state.reads().fetch_recommended_posts(&id, limit).await,
    ))
}

/// GET /api/posts/slug/{slug}
pub async fn get_post_by_slug<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Path(slug): Path<String>,
) -> ContentResult<Json<PostWithRelations>>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    state
        .reads()
        .fetch_post_by_slug(&slug)
        .await
        .map(Json)
        .ok_or(ContentError::PostNotFound)
}

// ============================================================================
// Public categories / authors
// ============================================================================

/// GET /api/categories
pub async fn list_categories<R, S>(
    State(state): State<ContentAppState<R, S>>,
) -> Json<Vec<Category>>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    Json(
        CategoriesUseCase::new(state.repo.clone())
            .fetch_categories()
            .await,
    )
}

/// GET /api/categories/{slug}/posts
pub async fn posts_by_category_slug<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Path(slug): Path<String>,
) -> Json<Vec<PostWithRelations>>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    Json(
        state
            .reads()
            .fetch_posts_by_category_slug(VisibilityFilter::Public, &slug)
            .await,
    )
}

/// GET /api/authors
pub async fn list_authors<R, S>(State(state): State<ContentAppState<R, S>>) -> Json<Vec<Author>>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    Json(AuthorsUseCase::new(state.repo.clone()).fetch_authors().await)
}

/// GET /api/authors/{id}
pub async fn get_author<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Path(id): Path<String>,
) -> ContentResult<Json<Author>>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let id: AuthorId = parse_id(&id)?;
    AuthorsUseCase::new(state.repo.clone())
        .get_author_by_id(&id)
        .await
        .map(Json)
        .ok_or(ContentError::AuthorNotFound)
}

// ============================================================================
// Admin posts
// ============================================================================

/// GET /api/admin/posts
pub async fn list_all_posts<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Query(params): Query<ListPostsParams>,
) -> ContentResult<Json<PostPage>>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let visibility = params.visibility_or(VisibilityFilter::All)?;
    Ok(Json(list(&state, &params, visibility).await?))
}

/// GET /api/admin/posts/{id}
pub async fn get_any_post<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Path(id): Path<String>,
) -> ContentResult<Json<PostWithRelations>>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let id: PostId = parse_id(&id)?;
    state
        .reads()
        .fetch_post_by_id(&id)
        .await
        .map(Json)
        .ok_or(ContentError::PostNotFound)
}

/// POST /api/admin/posts
pub async fn create_post<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Json(req): Json<CreatePostRequest>,
) -> ContentResult<impl IntoResponse>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let post = state.writes().create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PATCH /api/admin/posts/{id}
pub async fn update_post<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePostRequest>,
) -> ContentResult<Json<PostWithRelations>>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let id: PostId = parse_id(&id)?;
    Ok(Json(state.writes().update(&id, req.into()).await?))
}

/// DELETE /api/admin/posts/{id}
pub async fn delete_post<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Path(id): Path<String>,
) -> ContentResult<StatusCode>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let id: PostId = parse_id(&id)?;
    state.writes().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Admin categories
// ============================================================================

/// POST /api/admin/categories
pub async fn create_category<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Json(req): Json<CategoryRequest>,
) -> ContentResult<impl IntoResponse>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let category = CategoriesUseCase::new(state.repo.clone())
        .create(&req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PATCH /api/admin/categories/{id}
pub async fn update_category<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Path(id): Path<String>,
    Json(req): Json<CategoryRequest>,
) -> ContentResult<Json<Category>>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let id: CategoryId = parse_id(&id)?;
    Ok(Json(
        CategoriesUseCase::new(state.repo.clone())
            .update(&id, &req.name)
            .await?,
    ))
}

/// DELETE /api/admin/categories/{id}
pub async fn delete_category<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Path(id): Path<String>,
) -> ContentResult<StatusCode>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let id: CategoryId = parse_id(&id)?;
    CategoriesUseCase::new(state.repo.clone())
        .delete(&id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Admin authors
// ============================================================================

/// POST /api/admin/authors
pub async fn create_author<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Json(req): Json<CreateAuthorRequest>,
) -> ContentResult<impl IntoResponse>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let author = AuthorsUseCase::new(state.repo.clone())
        .create(req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// PATCH /api/admin/authors/{id}
pub async fn update_author<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAuthorRequest>,
) -> ContentResult<Json<Author>>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let id: AuthorId = parse_id(&id)?;
    Ok(Json(
        AuthorsUseCase::new(state.repo.clone())
            .update(&id, req.into())
            .await?,
    ))
}

/// DELETE /api/admin/authors/{id}
pub async fn delete_author<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Path(id): Path<String>,
) -> ContentResult<StatusCode>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let id: AuthorId = parse_id(&id)?;
    AuthorsUseCase::new(state.repo.clone()).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Admin images
// ============================================================================

/// POST /api/admin/images
///
/// Raw body; the `Content-Type` header selects the file extension.
pub async fn upload_image<R, S>(
    State(state): State<ContentAppState<R, S>>,
    headers: HeaderMap,
    body: Bytes,
) -> ContentResult<impl IntoResponse>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let stored = ImagesUseCase::new(state.storage.clone(), state.config.clone())
        .upload(body.to_vec(), &content_type)
        .await?;
    Ok((StatusCode::CREATED, Json(ImageResponse::from(stored))))
}

/// DELETE /api/admin/images/{*key}
pub async fn remove_image<R, S>(
    State(state): State<ContentAppState<R, S>>,
    Path(key): Path<String>,
) -> ContentResult<StatusCode>
where
    R: ContentStore,
    S: ObjectStorage + Send + Sync + 'static,
{
    ImagesUseCase::new(state.storage.clone(), state.config.clone())
        .remove(&key)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
