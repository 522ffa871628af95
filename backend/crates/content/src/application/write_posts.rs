//! Write Posts Use Case
//!
//! Mutations fail loudly: errors are logged with the operation name and
//! returned to the caller.

use std::sync::Arc;

use crate::application::config::ContentConfig;
use crate::domain::entity::{NewPost, Post, PostPatch, PostWithRelations};
use crate::domain::repository::ContentStore;
use crate::domain::value_object::{AuthorId, PostId};
use crate::error::{ContentError, ContentResult};

pub struct WritePostsUseCase<R>
where
    R: ContentStore,
{
    repo: Arc<R>,
    config: Arc<ContentConfig>,
}

impl<R> WritePostsUseCase<R>
where
    R: ContentStore,
{
    pub fn new(repo: Arc<R>, config: Arc<ContentConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn create(&self, input: NewPost) -> ContentResult<PostWithRelations> {
        self.try_create(input)
            .await
            .inspect_err(|e| e.log("create_post"))
    }

    /// Partial update; `category_ids` replaces the whole association set
    pub async fn update(&self, id: &PostId, patch: PostPatch) -> ContentResult<PostWithRelations> {
        self.try_update(id, patch)
            .await
            .inspect_err(|e| e.log("update_post"))
    }

    pub async fn delete(&self, id: &PostId) -> ContentResult<()> {
        self.repo
            .delete_post(id)
            .await
            .inspect(|()| tracing::info!(post_id = %id, "Post deleted"))
            .inspect_err(|e| e.log("delete_post"))
    }

    async fn try_create(&self, mut input: NewPost) -> ContentResult<PostWithRelations> {
        if let Some(author_id) = input.author_id {
            // Selecting an author always sets the display name
            input.author = Some(self.author_name(&author_id).await?);
        }

        let (post, category_ids) = Post::create(input, self.config.excerpt_length)?;
        self.repo.create_post(&post, &category_ids).await?;

        tracing::info!(
            post_id = %post.id,
            categories = category_ids.len(),
            visibility = post.visibility.as_str(),
            "Post created"
        );
        self.reload(&post.id).await
    }

    async fn try_update(&self, id: &PostId, mut patch: PostPatch) -> ContentResult<PostWithRelations> {
        let mut post = self
            .repo
            .find_post(id)
            .await?
            .ok_or(ContentError::PostNotFound)?
            .post;

        if let Some(Some(author_id)) = patch.author_id {
            patch.author = Some(Some(self.author_name(&author_id).await?));
        }

        let category_ids = post.apply(patch, self.config.excerpt_length)?;
        self.repo
            .update_post(&post, category_ids.as_deref())
            .await?;

        tracing::info!(
            post_id = %post.id,
            categories_replaced = category_ids.is_some(),
            "Post updated"
        );
        self.reload(&post.id).await
    }

    async fn author_name(&self, id: &AuthorId) -> ContentResult<String> {
        self.repo
            .find_author(id)
            .await?
            .map(|author| author.name)
            .ok_or(ContentError::AuthorNotFound)
    }

    async fn reload(&self, id: &PostId) -> ContentResult<PostWithRelations> {
        self.repo
            .find_post(id)
            .await?
            .ok_or_else(|| ContentError::Internal(format!("Post {id} vanished after write")))
    }
}
