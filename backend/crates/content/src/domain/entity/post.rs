//! Post entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::author::Author;
use crate::domain::entity::category::CategoryRef;
use crate::domain::value_object::{
    AuthorId, CategoryId, PostId, Visibility,
    excerpt::derive_excerpt,
    slug::{generate_slug, is_valid_slug},
};
use crate::error::{ContentError, ContentResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    /// Rich text (HTML)
    pub content: String,
    pub excerpt: String,
    pub image: Option<String>,
    /// Display name, denormalized from the referenced author when one is set
    pub author: Option<String>,
    pub author_id: Option<AuthorId>,
    pub visibility: Visibility,
    pub slug: Option<String>,
    /// Explicit publication date shown instead of `created_at`
    pub date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post with its categories and author joined in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithRelations {
    #[serde(flatten)]
    pub post: Post,
    pub categories: Vec<CategoryRef>,
    pub author_data: Option<Author>,
}

impl PostWithRelations {
    pub fn category_ids(&self) -> Vec<CategoryId> {
        self.categories.iter().map(|c| c.id).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub image: Option<String>,
    pub author: Option<String>,
    pub author_id: Option<AuthorId>,
    pub visibility: Visibility,
    pub slug: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub category_ids: Vec<CategoryId>,
}

/// Partial update. `None` leaves a field alone; for nullable fields
/// `Some(None)` clears it. `category_ids` replaces the whole set.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub image: Option<Option<String>>,
    pub author: Option<Option<String>>,
    pub author_id: Option<Option<AuthorId>>,
    pub visibility: Option<Visibility>,
    pub slug: Option<String>,
    pub date: Option<Option<DateTime<Utc>>>,
    pub category_ids: Option<Vec<CategoryId>>,
}

impl Post {
    /// Build a post from creation input; excerpt and slug are derived when absent
    pub fn create(input: NewPost, excerpt_len: usize) -> ContentResult<(Self, Vec<CategoryId>)> {
        let title = required("title", input.title)?;
        let content = required("content", input.content)?;

        let excerpt = match non_empty(input.excerpt) {
            Some(excerpt) => excerpt,
            None => derive_excerpt(&content, excerpt_len),
        };
        let slug = match input.slug {
            Some(slug) => Some(explicit_slug(&slug)?),
            None => Some(generate_slug(&title)).filter(|s| !s.is_empty()),
        };

        let now = Utc::now();
        let post = Self {
            id: PostId::new(),
            title,
            content,
            excerpt,
            image: non_empty(input.image),
            author: non_empty(input.author),
            author_id: input.author_id,
            visibility: input.visibility,
            slug,
            date: input.date,
            created_at: now,
            updated_at: now,
        };
        Ok((post, dedup(input.category_ids)))
    }

    /// Apply a patch; the slug only changes when one is given explicitly
    pub fn apply(
        &mut self,
        patch: PostPatch,
        excerpt_len: usize,
    ) -> ContentResult<Option<Vec<CategoryId>>> {
        if let Some(title) = patch.title {
            self.title = required("title", title)?;
        }
        if let Some(content) = patch.content {
            self.content = required("content", content)?;
        }
        if let Some(excerpt) = patch.excerpt {
            self.excerpt = match non_empty(Some(excerpt)) {
                Some(excerpt) => excerpt,
                None => derive_excerpt(&self.content, excerpt_len),
            };
        }
        if let Some(image) = patch.image {
            self.image = non_empty(image);
        }
        if let Some(author) = patch.author {
            self.author = non_empty(author);
        }
        if let Some(author_id) = patch.author_id {
            self.author_id = author_id;
        }
        if let Some(visibility) = patch.visibility {
            self.visibility = visibility;
        }
        if let Some(slug) = patch.slug {
            self.slug = Some(explicit_slug(&slug)?);
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        self.updated_at = Utc::now();

        Ok(patch.category_ids.map(dedup))
    }
}

fn required(field: &str, value: String) -> ContentResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ContentError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn explicit_slug(slug: &str) -> ContentResult<String> {
    let slug = generate_slug(slug);
    if !is_valid_slug(&slug) {
        return Err(ContentError::Validation(
            "slug must contain letters or digits".to_string(),
        ));
    }
    Ok(slug)
}

/// Keep the first occurrence of each id
fn dedup(ids: Vec<CategoryId>) -> Vec<CategoryId> {
    let mut out: Vec<CategoryId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewPost {
        NewPost {
            title: "¿Qué es la Mediación Familiar?".to_string(),
            content: "<p>La mediación familiar es un procedimiento voluntario.</p>".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_derives_slug_and_excerpt() {
        let (post, categories) = Post::create(input(), 160).unwrap();
        assert_eq!(post.slug.as_deref(), Some("que-es-la-mediacion-familiar"));
        assert_eq!(
            post.excerpt,
            "La mediación familiar es un procedimiento voluntario."
        );
        assert_eq!(post.visibility, Visibility::Public);
        assert!(categories.is_empty());
    }

    #[test]
    fn test_create_requires_title_and_content() {
        let mut missing_title = input();
        missing_title.title = "   ".to_string();
        assert!(matches!(
            Post::create(missing_title, 160),
            Err(ContentError::Validation(_))
        ));

        let mut missing_content = input();
        missing_content.content = String::new();
        assert!(Post::create(missing_content, 160).is_err());
    }

    #[test]
    fn test_create_dedups_categories() {
        let a = CategoryId::new();
        let b = CategoryId::new();
        let mut new = input();
        new.category_ids = vec![a, b, a];

        let (_, categories) = Post::create(new, 160).unwrap();
        assert_eq!(categories, vec![a, b]);
    }

    #[test]
    fn test_patch_keeps_slug_unless_given() {
        let (mut post, _) = Post::create(input(), 160).unwrap();

        let ids = post
            .apply(
                PostPatch {
                    title: Some("Otro título".to_string()),
                    image: Some(None),
                    ..Default::default()
                },
                160,
            )
            .unwrap();
        assert!(ids.is_none());
        assert_eq!(post.title, "Otro título");
        assert_eq!(post.slug.as_deref(), Some("que-es-la-mediacion-familiar"));

        post.apply(
            PostPatch {
                slug: Some("Nuevo Slug".to_string()),
                ..Default::default()
            },
            160,
        )
        .unwrap();
        assert_eq!(post.slug.as_deref(), Some("nuevo-slug"));
    }

    #[test]
    fn test_patch_empty_excerpt_rederives() {
        let (mut post, _) = Post::create(input(), 160).unwrap();
        post.excerpt = "manual".to_string();

        post.apply(
            PostPatch {
                excerpt: Some(String::new()),
                ..Default::default()
            },
            10,
        )
        .unwrap();
        assert_eq!(post.excerpt, "La...");
    }
}
