//! In-memory repository used in demo mode and tests
//!
//! All collections sit behind one `RwLock` so a listing sees a single
//! snapshot and a rename rewrites every denormalized copy atomically.
//! Clones share the same state.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::entity::{
    Author, Category, CategoryRef, Post, PostCategory, PostWithRelations,
};
use crate::domain::query::{PostPage, PostQuery};
use crate::domain::repository::{AuthorRepository, CategoryRepository, PostRepository};
use crate::domain::value_object::name_order::cmp_names;
use crate::domain::value_object::{AuthorId, CategoryId, PostId, SortOrder, Visibility};
use crate::error::{ContentError, ContentResult};
use crate::infra::seed::{self, SeedData};

#[derive(Default)]
struct Collections {
    posts: HashMap<PostId, Post>,
    categories: HashMap<CategoryId, Category>,
    authors: HashMap<AuthorId, Author>,
    associations: Vec<PostCategory>,
}

impl Collections {
    fn category_ids(&self, post_id: &PostId) -> Vec<CategoryId> {
        self.associations
            .iter()
            .filter(|a| &a.post_id == post_id)
            .map(|a| a.category_id)
            .collect()
    }

    fn with_relations(&self, post: &Post) -> PostWithRelations {
        let mut categories: Vec<_> = self
            .associations
            .iter()
            .filter(|a| a.post_id == post.id)
            .map(|a| CategoryRef {
                id: a.category_id,
                name: a.category_name.clone(),
            })
            .collect();
        categories.sort_by(|a, b| cmp_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));

        PostWithRelations {
            post: post.clone(),
            categories,
            author_data: post
                .author_id
                .and_then(|id| self.authors.get(&id))
                .cloned(),
        }
    }

    fn ensure_categories(&self, ids: &[CategoryId]) -> ContentResult<()> {
        if ids.iter().all(|id| self.categories.contains_key(id)) {
            Ok(())
        } else {
            Err(ContentError::CategoryNotFound)
        }
    }

    fn ensure_author(&self, id: Option<AuthorId>) -> ContentResult<()> {
        match id {
            Some(id) if !self.authors.contains_key(&id) => Err(ContentError::AuthorNotFound),
            _ => Ok(()),
        }
    }

    fn associate(&mut self, post: &Post, ids: &[CategoryId]) {
        let now = Utc::now();
        for id in ids {
            let Some(category) = self.categories.get(id) else {
                continue;
            };
            if self
                .associations
                .iter()
                .any(|a| a.post_id == post.id && &a.category_id == id)
            {
                continue;
            }
            self.associations.push(PostCategory {
                post_id: post.id,
                category_id: *id,
                category_name: category.name.clone(),
                visibility: Some(post.visibility),
                created_at: now,
            });
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryContentRepository {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository preloaded with the demo dataset
    pub fn seeded() -> Self {
        Self::with_data(seed::demo_dataset())
    }

    pub fn with_data(data: SeedData) -> Self {
        let mut collections = Collections::default();
        for category in data.categories {
            collections.categories.insert(category.id, category);
        }
        for author in data.authors {
            collections.authors.insert(author.id, author);
        }
        for (post, category_ids) in data.posts {
            collections.associate(&post, &category_ids);
            collections.posts.insert(post.id, post);
        }

        tracing::debug!(
            posts = collections.posts.len(),
            categories = collections.categories.len(),
            authors = collections.authors.len(),
            "Demo content loaded"
        );
        Self {
            inner: Arc::new(RwLock::new(collections)),
        }
    }
}

fn by_created(a: &Post, b: &Post) -> Ordering {
    a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
}

impl PostRepository for MemoryContentRepository {
    async fn query_posts(&self, query: &PostQuery) -> ContentResult<PostPage> {
        let data = self.inner.read().await;
        let search = query.search_lower();

        let mut matched: Vec<&Post> = data
            .posts
            .values()
            .filter(|p| query.visibility.matches(p.visibility))
            .filter(|p| !query.exclude.contains(&p.id))
            .filter(|p| query.category.matches(&data.category_ids(&p.id)))
            .filter(|p| {
                search.as_deref().is_none_or(|term| {
                    p.title.to_lowercase().contains(term) || p.excerpt.to_lowercase().contains(term)
                })
            })
            .collect();

        matched.sort_by(|a, b| match query.sort {
            SortOrder::Asc => by_created(a, b),
            SortOrder::Desc => by_created(b, a),
        });

        let total = matched.len() as u64;
        let (skip, take) = match query.window {
            Some(w) => (w.offset as usize, w.limit as usize),
            None => (0, usize::MAX),
        };
        let posts = matched
            .iter()
            .skip(skip)
            .take(take)
            .map(|p| data.with_relations(p))
            .collect();

        Ok(PostPage::new(posts, total, query.window))
    }

    async fn find_post(&self, id: &PostId) -> ContentResult<Option<PostWithRelations>> {
        let data = self.inner.read().await;
        Ok(data.posts.get(id).map(|p| data.with_relations(p)))
    }

    async fn find_public_post_by_slug(
        &self,
        slug: &str,
    ) -> ContentResult<Option<PostWithRelations>> {
        let data = self.inner.read().await;
        Ok(data
            .posts
            .values()
            .filter(|p| p.visibility == Visibility::Public && p.slug.as_deref() == Some(slug))
            .max_by(|a, b| by_created(a, b))
            .map(|p| data.with_relations(p)))
    }

    async fn create_post(&self, post: &Post, category_ids: &[CategoryId]) -> ContentResult<()> {
        let mut data = self.inner.write().await;
        data.ensure_categories(category_ids)?;
        data.ensure_author(post.author_id)?;

        data.associate(post, category_ids);
        data.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn update_post(
        &self,
        post: &Post,
        category_ids: Option<&[CategoryId]>,
    ) -> ContentResult<()> {
        let mut data = self.inner.write().await;
        if !data.posts.contains_key(&post.id) {
            return Err(ContentError::PostNotFound);
        }
        if let Some(ids) = category_ids {
            data.ensure_categories(ids)?;
        }
        data.ensure_author(post.author_id)?;

        match category_ids {
            Some(ids) => {
                data.associations.retain(|a| a.post_id != post.id);
                data.associate(post, ids);
            }
            None => {
                for association in data.associations.iter_mut().filter(|a| a.post_id == post.id) {
                    association.visibility = Some(post.visibility);
                }
            }
        }
        data.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn delete_post(&self, id: &PostId) -> ContentResult<()> {
        let mut data = self.inner.write().await;
        data.posts.remove(id).ok_or(ContentError::PostNotFound)?;
        data.associations.retain(|a| &a.post_id != id);
        Ok(())
    }
}

impl CategoryRepository for MemoryContentRepository {
    async fn list_categories(&self) -> ContentResult<Vec<Category>> {
        let mut categories: Vec<Category> =
            self.inner.read().await.categories.values().cloned().collect();
        categories.sort_by(|a, b| cmp_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn find_category(&self, id: &CategoryId) -> ContentResult<Option<Category>> {
        Ok(self.inner.read().await.categories.get(id).cloned())
    }

    async fn create_category(&self, category: &Category) -> ContentResult<()> {
        self.inner
            .write()
            .await
            .categories
            .insert(category.id, category.clone());
        Ok(())
    }

    async fn rename_category(&self, id: &CategoryId, name: &str) -> ContentResult<Category> {
        let mut data = self.inner.write().await;
        let category = data
            .categories
            .get_mut(id)
            .ok_or(ContentError::CategoryNotFound)?;
        category.name = name.to_string();
        let renamed = category.clone();

        for association in data.associations.iter_mut().filter(|a| &a.category_id == id) {
            association.category_name = renamed.name.clone();
        }
        Ok(renamed)
    }

    async fn delete_category(&self, id: &CategoryId) -> ContentResult<()> {
        let mut data = self.inner.write().await;
        data.categories
            .remove(id)
            .ok_or(ContentError::CategoryNotFound)?;
        data.associations.retain(|a| &a.category_id != id);
        Ok(())
    }
}

impl AuthorRepository for MemoryContentRepository {
    async fn list_authors(&self) -> ContentResult<Vec<Author>> {
        let mut authors: Vec<Author> = self.inner.read().await.authors.values().cloned().collect();
        authors.sort_by(|a, b| cmp_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(authors)
    }

    async fn find_author(&self, id: &AuthorId) -> ContentResult<Option<Author>> {
        Ok(self.inner.read().await.authors.get(id).cloned())
    }

    async fn create_author(&self, author: &Author) -> ContentResult<()> {
        self.inner
            .write()
            .await
            .authors
            .insert(author.id, author.clone());
        Ok(())
    }

    async fn update_author(&self, author: &Author) -> ContentResult<()> {
        let mut data = self.inner.write().await;
        let slot = data
            .authors
            .get_mut(&author.id)
            .ok_or(ContentError::AuthorNotFound)?;
        *slot = author.clone();

        for post in data
            .posts
            .values_mut()
            .filter(|p| p.author_id == Some(author.id))
        {
            post.author = Some(author.name.clone());
        }
        Ok(())
    }

    async fn delete_author(&self, id: &AuthorId) -> ContentResult<()> {
        let mut data = self.inner.write().await;
        data.authors.remove(id).ok_or(ContentError::AuthorNotFound)?;

        for post in data.posts.values_mut().filter(|p| p.author_id == Some(*id)) {
            post.author_id = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::NewPost;
    use crate::domain::query::CategoryFilter;
    use crate::domain::value_object::VisibilityFilter;

    async fn with_post(repo: &MemoryContentRepository, category: &Category) -> Post {
        let (post, ids) = Post::create(
            NewPost {
                title: "Despido improcedente".to_string(),
                content: "<p>Plazos y requisitos.</p>".to_string(),
                category_ids: vec![category.id],
                ..Default::default()
            },
            160,
        )
        .unwrap();
        repo.create_post(&post, &ids).await.unwrap();
        post
    }

    #[tokio::test]
    async fn test_rename_rewrites_associations() {
        let repo = MemoryContentRepository::new();
        let category = Category::new("Laboral").unwrap();
        repo.create_category(&category).await.unwrap();
        let post = with_post(&repo, &category).await;

        repo.rename_category(&category.id, "Derecho Laboral")
            .await
            .unwrap();

        let loaded = repo.find_post(&post.id).await.unwrap().unwrap();
        assert_eq!(loaded.categories[0].name, "Derecho Laboral");
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() {
        let repo = MemoryContentRepository::new();
        let ghost = Category::new("Fantasma").unwrap();
        let (post, _) = Post::create(
            NewPost {
                title: "t".to_string(),
                content: "c".to_string(),
                ..Default::default()
            },
            160,
        )
        .unwrap();

        let err = repo.create_post(&post, &[ghost.id]).await.unwrap_err();
        assert!(matches!(err, ContentError::CategoryNotFound));
        assert!(repo.find_post(&post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_category_strips_posts() {
        let repo = MemoryContentRepository::new();
        let category = Category::new("Penal").unwrap();
        repo.create_category(&category).await.unwrap();
        let post = with_post(&repo, &category).await;

        repo.delete_category(&category.id).await.unwrap();

        let uncategorized = repo
            .query_posts(&PostQuery::new(VisibilityFilter::All).category(CategoryFilter::Uncategorized))
            .await
            .unwrap();
        assert_eq!(uncategorized.total_count, 1);
        assert_eq!(uncategorized.posts[0].post.id, post.id);
        assert!(matches!(
            repo.delete_category(&category.id).await,
            Err(ContentError::CategoryNotFound)
        ));
    }
}
