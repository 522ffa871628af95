//! Read Posts Use Case
//!
//! Every read degrades: a failing store is logged at `error` with the
//! operation name and the caller receives an empty result.

use std::sync::Arc;

use crate::application::config::ContentConfig;
use crate::domain::entity::PostWithRelations;
use crate::domain::query::{CategoryFilter, PostPage, PostQuery};
use crate::domain::repository::ContentStore;
use crate::domain::value_object::slug::generate_slug;
use crate::domain::value_object::{CategoryId, PostId, SortOrder, VisibilityFilter};
use crate::error::ContentResult;

/// Log a failed read and fall back to the empty value
pub(crate) fn degrade<T: Default>(operation: &'static str, result: ContentResult<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!(operation, error = %e, "Content read failed, returning empty result");
        T::default()
    })
}

/// Pagination window and ordering of a listing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
    pub sort: SortOrder,
}

impl PageRequest {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit,
            offset,
            sort: SortOrder::default(),
        }
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

pub struct ReadPostsUseCase<R>
where
    R: ContentStore,
{
    repo: Arc<R>,
    config: Arc<ContentConfig>,
}

impl<R> ReadPostsUseCase<R>
where
    R: ContentStore,
{
    pub fn new(repo: Arc<R>, config: Arc<ContentConfig>) -> Self {
        Self { repo, config }
    }

    /// Posts by visibility. A category restricts the result to posts
    /// associated with it, so uncategorized posts drop out.
    pub async fn fetch_posts(
        &self,
        visibility: VisibilityFilter,
        category_id: Option<CategoryId>,
    ) -> Vec<PostWithRelations> {
        let category = category_id.map_or(CategoryFilter::Any, CategoryFilter::Category);
        let query = PostQuery::new(visibility).category(category);
        degrade("fetch_posts", self.all(&query).await)
    }

    /// Posts by visibility; `Any` includes uncategorized posts
    pub async fn fetch_posts_including_uncategorized(
        &self,
        visibility: VisibilityFilter,
        category: CategoryFilter,
    ) -> Vec<PostWithRelations> {
        let query = PostQuery::new(visibility).category(category);
        degrade(
            "fetch_posts_including_uncategorized",
            self.all(&query).await,
        )
    }

    pub async fn fetch_posts_including_uncategorized_with_pagination(
        &self,
        visibility: VisibilityFilter,
        category: CategoryFilter,
        page: PageRequest,
    ) -> PostPage {
        let query = Self::windowed(PostQuery::new(visibility).category(category), page);
        degrade(
            "fetch_posts_including_uncategorized_with_pagination",
            self.repo.query_posts(&query).await,
        )
    }

    pub async fn fetch_uncategorized_posts_with_pagination(
        &self,
        visibility: VisibilityFilter,
        page: PageRequest,
    ) -> PostPage {
        let query = Self::windowed(
            PostQuery::new(visibility).category(CategoryFilter::Uncategorized),
            page,
        );
        degrade(
            "fetch_uncategorized_posts_with_pagination",
            self.repo.query_posts(&query).await,
        )
    }

    /// Case-insensitive substring match against title or excerpt
    pub async fn search_posts_with_pagination(
        &self,
        term: &str,
        visibility: VisibilityFilter,
        category: CategoryFilter,
        page: PageRequest,
    ) -> PostPage {
        let query = Self::windowed(
            PostQuery::new(visibility)
                .category(category)
                .search(Some(term)),
            page,
        );
        degrade(
            "search_posts_with_pagination",
            self.repo.query_posts(&query).await,
        )
    }

    pub async fn fetch_post_by_id(&self, id: &PostId) -> Option<PostWithRelations> {
        degrade("fetch_post_by_id", self.repo.find_post(id).await)
    }

    /// Only PUBLIC posts are reachable by slug
    pub async fn fetch_post_by_slug(&self, slug: &str) -> Option<PostWithRelations> {
        let slug = generate_slug(slug);
        if slug.is_empty() {
            return None;
        }
        degrade(
            "fetch_post_by_slug",
            self.repo.find_public_post_by_slug(&slug).await,
        )
    }

    /// Public posts sharing a category with the current one, newest first,
    /// backfilled with the latest public posts
    pub async fn fetch_recommended_posts(
        &self,
        current: &PostId,
        limit: u32,
    ) -> Vec<PostWithRelations> {
        degrade(
            "fetch_recommended_posts",
            self.recommended(current, limit.min(self.config.max_page_size))
                .await,
        )
    }

    /// Most recent PUBLIC posts
    pub async fn fetch_latest_posts(
        &self,
        limit: u32,
        exclude: Option<PostId>,
    ) -> Vec<PostWithRelations> {
        let query = PostQuery::new(VisibilityFilter::Public)
            .excluding(exclude)
            .page(limit.min(self.config.max_page_size), 0);
        degrade("fetch_latest_posts", self.all(&query).await)
    }

    /// Resolve the slug to a category, then list its posts
    pub async fn fetch_posts_by_category_slug(
        &self,
        visibility: VisibilityFilter,
        slug: &str,
    ) -> Vec<PostWithRelations> {
        degrade(
            "fetch_posts_by_category_slug",
            self.by_category_slug(visibility, slug).await,
        )
    }

    async fn all(&self, query: &PostQuery) -> ContentResult<Vec<PostWithRelations>> {
        Ok(self.repo.query_posts(query).await?.posts)
    }

    fn windowed(query: PostQuery, page: PageRequest) -> PostQuery {
        query.sorted(page.sort).page(page.limit, page.offset)
    }

    async fn recommended(
        &self,
        current: &PostId,
        limit: u32,
    ) -> ContentResult<Vec<PostWithRelations>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let category_ids = self
            .repo
            .find_post(current)
            .await?
            .map(|post| post.category_ids())
            .unwrap_or_default();

        let mut posts = if category_ids.is_empty() {
            Vec::new()
        } else {
            let related = PostQuery::new(VisibilityFilter::Public)
                .category(CategoryFilter::AnyOf(category_ids))
                .excluding([*current])
                .page(limit, 0);
            self.all(&related).await?
        };

        let missing = limit.saturating_sub(posts.len() as u32);
        if missing > 0 {
            let backfill = PostQuery::new(VisibilityFilter::Public)
                .excluding([*current])
                .excluding(posts.iter().map(|p| p.post.id))
                .page(missing, 0);
            posts.extend(self.all(&backfill).await?);
        }

        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn by_category_slug(
        &self,
        visibility: VisibilityFilter,
        slug: &str,
    ) -> ContentResult<Vec<PostWithRelations>> {
        let wanted = generate_slug(slug);
        let categories = self.repo.list_categories().await?;

        let Some(category) = categories.into_iter().find(|c| {
            c.name.eq_ignore_ascii_case(slug.trim())
                || (!wanted.is_empty() && generate_slug(&c.name) == wanted)
        }) else {
            tracing::debug!(slug = %slug, "No category matches slug");
            return Ok(Vec::new());
        };

        let query = PostQuery::new(visibility).category(CategoryFilter::Category(category.id));
        self.all(&query).await
    }
}
