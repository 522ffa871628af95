//! API DTOs (Data Transfer Objects)
//!
//! Entities serialize as-is on the way out; these types cover request
//! bodies, query strings and the image upload response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use platform::storage::StoredObject;

use crate::application::{ContentConfig, PageRequest};
use crate::domain::entity::{AuthorPatch, NewAuthor, NewPost, PostPatch};
use crate::domain::query::CategoryFilter;
use crate::domain::value_object::{
    AuthorId, CategoryId, PostId, SortOrder, Visibility, VisibilityFilter,
};
use crate::error::ContentResult;

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

// ============================================================================
// Posts
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub image: Option<String>,
    pub author: Option<String>,
    pub author_id: Option<AuthorId>,
    #[serde(default)]
    pub visibility: Visibility,
    pub slug: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
}

impl From<CreatePostRequest> for NewPost {
    fn from(req: CreatePostRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            excerpt: req.excerpt,
            image: req.image,
            author: req.author,
            author_id: req.author_id,
            visibility: req.visibility,
            slug: req.slug,
            date: req.date,
            category_ids: req.category_ids,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub author: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub author_id: Option<Option<AuthorId>>,
    pub visibility: Option<Visibility>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub date: Option<Option<DateTime<Utc>>>,
    pub category_ids: Option<Vec<CategoryId>>,
}

impl From<UpdatePostRequest> for PostPatch {
    fn from(req: UpdatePostRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            excerpt: req.excerpt,
            image: req.image,
            author: req.author,
            author_id: req.author_id,
            visibility: req.visibility,
            slug: req.slug,
            date: req.date,
            category_ids: req.category_ids,
        }
    }
}

/// Query string of the post listings
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsParams {
    pub visibility: Option<String>,
    /// A category id or `uncategorized`
    pub category_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub sort_order: Option<String>,
    pub q: Option<String>,
}

impl ListPostsParams {
    pub fn visibility_or(&self, default: VisibilityFilter) -> ContentResult<VisibilityFilter> {
        match self.visibility.as_deref().map(str::trim) {
            None | Some("") => Ok(default),
            Some(v) => Ok(v.parse()?),
        }
    }

    pub fn category(&self) -> ContentResult<CategoryFilter> {
        CategoryFilter::from_param(self.category_id.as_deref())
    }

    pub fn page(&self, config: &ContentConfig) -> ContentResult<PageRequest> {
        let sort = match self.sort_order.as_deref().map(str::trim) {
            None | Some("") => SortOrder::default(),
            Some(s) => s.parse()?,
        };
        let limit = config.clamp_limit(self.limit, config.default_page_size);
        Ok(PageRequest::new(limit, self.offset.unwrap_or(0)).sorted(sort))
    }

    pub fn search_term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestParams {
    pub limit: Option<u32>,
    pub exclude_id: Option<PostId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<u32>,
}

// ============================================================================
// Categories / Authors
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuthorRequest {
    pub name: String,
    pub role: Option<String>,
    pub description: Option<String>,
    pub profile_picture_url: Option<String>,
    pub email: Option<String>,
}

impl From<CreateAuthorRequest> for NewAuthor {
    fn from(req: CreateAuthorRequest) -> Self {
        Self {
            name: req.name,
            role: req.role,
            description: req.description,
            profile_picture_url: req.profile_picture_url,
            email: req.email,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuthorRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub role: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub profile_picture_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
}

impl From<UpdateAuthorRequest> for AuthorPatch {
    fn from(req: UpdateAuthorRequest) -> Self {
        Self {
            name: req.name,
            role: req.role,
            description: req.description,
            profile_picture_url: req.profile_picture_url,
            email: req.email,
        }
    }
}

// ============================================================================
// Images
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub key: String,
    pub url: String,
    pub size: u64,
}

impl From<StoredObject> for ImageResponse {
    fn from(object: StoredObject) -> Self {
        Self {
            key: object.key,
            url: object.public_url,
            size: object.size as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let req: UpdatePostRequest =
            serde_json::from_str(r#"{"title":"Nuevo","image":null}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("Nuevo"));
        assert_eq!(req.image, Some(None));
        assert_eq!(req.author, None);
        assert!(req.category_ids.is_none());

        let req: UpdatePostRequest = serde_json::from_str(r#"{"categoryIds":[]}"#).unwrap();
        assert_eq!(req.category_ids, Some(vec![]));
    }

    #[test]
    fn test_create_defaults() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"title":"t","content":"c"}"#).unwrap();
        assert_eq!(req.visibility, Visibility::Public);
        assert!(req.category_ids.is_empty());
    }

    #[test]
    fn test_list_params() {
        let config = ContentConfig::default();
        let params = ListPostsParams {
            visibility: Some("private".to_string()),
            category_id: Some("uncategorized".to_string()),
            limit: Some(500),
            sort_order: Some("ASC".to_string()),
            q: Some("  ".to_string()),
            ..Default::default()
        };

        assert_eq!(
            params.visibility_or(VisibilityFilter::All).unwrap(),
            VisibilityFilter::Private
        );
        assert_eq!(params.category().unwrap(), CategoryFilter::Uncategorized);
        let page = params.page(&config).unwrap();
        assert_eq!(page.limit, 100);
        assert_eq!(page.sort, SortOrder::Asc);
        assert!(params.search_term().is_none());

        let bad = ListPostsParams {
            sort_order: Some("sideways".to_string()),
            ..Default::default()
        };
        assert!(bad.page(&config).is_err());
    }
}
