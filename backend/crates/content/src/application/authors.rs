//! Authors Use Case

use std::sync::Arc;

use crate::application::read_posts::degrade;
use crate::domain::entity::{Author, AuthorPatch, NewAuthor};
use crate::domain::repository::ContentStore;
use crate::domain::value_object::AuthorId;
use crate::error::{ContentError, ContentResult};

pub struct AuthorsUseCase<R>
where
    R: ContentStore,
{
    repo: Arc<R>,
}

impl<R> AuthorsUseCase<R>
where
    R: ContentStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn fetch_authors(&self) -> Vec<Author> {
        degrade("fetch_authors", self.repo.list_authors().await)
    }

    pub async fn get_author_by_id(&self, id: &AuthorId) -> Option<Author> {
        degrade("get_author_by_id", self.repo.find_author(id).await)
    }

    pub async fn create(&self, input: NewAuthor) -> ContentResult<Author> {
        let result: ContentResult<Author> = async {
            let author = Author::create(input)?;
            self.repo.create_author(&author).await?;
            Ok(author)
        }
        .await;

        result
            .inspect(|a| tracing::info!(author_id = %a.id, "Author created"))
            .inspect_err(|e| e.log("create_author"))
    }

    /// A new name is copied onto every post referencing the author
    pub async fn update(&self, id: &AuthorId, patch: AuthorPatch) -> ContentResult<Author> {
        let result: ContentResult<(Author, bool)> = async {
            let mut author = self
                .repo
                .find_author(id)
                .await?
                .ok_or(ContentError::AuthorNotFound)?;
            let renamed = author.apply(patch)?;
            self.repo.update_author(&author).await?;
            Ok((author, renamed))
        }
        .await;

        result
            .inspect(|(a, renamed)| {
                tracing::info!(author_id = %a.id, renamed = *renamed, "Author updated")
            })
            .inspect_err(|e| e.log("update_author"))
            .map(|(author, _)| author)
    }

    /// Posts keep their denormalized author name
    pub async fn delete(&self, id: &AuthorId) -> ContentResult<()> {
        self.repo
            .delete_author(id)
            .await
            .inspect(|()| tracing::info!(author_id = %id, "Author deleted"))
            .inspect_err(|e| e.log("delete_author"))
    }
}
