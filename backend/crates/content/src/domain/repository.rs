//! Repository Traits
//!
//! One contract, two implementations: Postgres and the in-memory demo mirror.
//! Both must filter, sort and paginate identically.

use crate::domain::entity::{Author, Category, Post, PostWithRelations};
use crate::domain::query::{PostPage, PostQuery};
use crate::domain::value_object::{AuthorId, CategoryId, PostId};
use crate::error::ContentResult;

#[trait_variant::make(PostRepository: Send)]
pub trait LocalPostRepository {
    /// Filtered page; the count and the page come from one snapshot
    async fn query_posts(&self, query: &PostQuery) -> ContentResult<PostPage>;

    async fn find_post(&self, id: &PostId) -> ContentResult<Option<PostWithRelations>>;

    /// Newest PUBLIC post with this slug
    async fn find_public_post_by_slug(&self, slug: &str)
    -> ContentResult<Option<PostWithRelations>>;

    /// Insert the post and one association per category
    async fn create_post(&self, post: &Post, category_ids: &[CategoryId]) -> ContentResult<()>;

    /// Update the row; `Some` replaces the full association set
    async fn update_post(
        &self,
        post: &Post,
        category_ids: Option<&[CategoryId]>,
    ) -> ContentResult<()>;

    /// Delete the post and its associations
    async fn delete_post(&self, id: &PostId) -> ContentResult<()>;
}

#[trait_variant::make(CategoryRepository: Send)]
pub trait LocalCategoryRepository {
    /// Sorted by name ascending
    async fn list_categories(&self) -> ContentResult<Vec<Category>>;

    async fn find_category(&self, id: &CategoryId) -> ContentResult<Option<Category>>;

    async fn create_category(&self, category: &Category) -> ContentResult<()>;

    /// Rename; posts must see the new name on their next read
    async fn rename_category(&self, id: &CategoryId, name: &str) -> ContentResult<Category>;

    /// Delete the category and strip it from every post
    async fn delete_category(&self, id: &CategoryId) -> ContentResult<()>;
}

#[trait_variant::make(AuthorRepository: Send)]
pub trait LocalAuthorRepository {
    /// Sorted by name ascending
    async fn list_authors(&self) -> ContentResult<Vec<Author>>;

    async fn find_author(&self, id: &AuthorId) -> ContentResult<Option<Author>>;

    async fn create_author(&self, author: &Author) -> ContentResult<()>;

    /// Save the author and rewrite the `author` name on referencing posts
    async fn update_author(&self, author: &Author) -> ContentResult<()>;

    /// Referencing posts are kept
    async fn delete_author(&self, id: &AuthorId) -> ContentResult<()>;
}

/// Everything the content use cases need from one store
pub trait ContentStore:
    PostRepository + CategoryRepository + AuthorRepository + Clone + Send + Sync + 'static
{
}

impl<T> ContentStore for T where
    T: PostRepository + CategoryRepository + AuthorRepository + Clone + Send + Sync + 'static
{
}
