//! Categories Use Case

use std::sync::Arc;

use crate::application::read_posts::degrade;
use crate::domain::entity::Category;
use crate::domain::repository::ContentStore;
use crate::domain::value_object::CategoryId;
use crate::error::ContentResult;

pub struct CategoriesUseCase<R>
where
    R: ContentStore,
{
    repo: Arc<R>,
}

impl<R> CategoriesUseCase<R>
where
    R: ContentStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Sorted by name; empty on failure
    pub async fn fetch_categories(&self) -> Vec<Category> {
        degrade("fetch_categories", self.repo.list_categories().await)
    }

    pub async fn create(&self, name: &str) -> ContentResult<Category> {
        let result: ContentResult<Category> = async {
            let category = Category::new(name)?;
            self.repo.create_category(&category).await?;
            Ok(category)
        }
        .await;

        result
            .inspect(|c| tracing::info!(category_id = %c.id, name = %c.name, "Category created"))
            .inspect_err(|e| e.log("create_category"))
    }

    /// Rename; posts show the new name on their next read
    pub async fn update(&self, id: &CategoryId, name: &str) -> ContentResult<Category> {
        let result: ContentResult<Category> = async {
            let name = Category::validate_name(name)?;
            self.repo.rename_category(id, &name).await
        }
        .await;

        result
            .inspect(|c| tracing::info!(category_id = %c.id, name = %c.name, "Category renamed"))
            .inspect_err(|e| e.log("update_category"))
    }

    /// Remove the category from every post, then delete it
    pub async fn delete(&self, id: &CategoryId) -> ContentResult<()> {
        self.repo
            .delete_category(id)
            .await
            .inspect(|()| tracing::info!(category_id = %id, "Category deleted"))
            .inspect_err(|e| e.log("delete_category"))
    }
}
