//! Category entity and the post/category association

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::{CategoryId, PostId, Visibility};
use crate::error::{ContentError, ContentResult};

pub const MAX_CATEGORY_NAME: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: &str) -> ContentResult<Self> {
        Ok(Self {
            id: CategoryId::new(),
            name: Self::validate_name(name)?,
            created_at: Utc::now(),
        })
    }

    pub fn validate_name(name: &str) -> ContentResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ContentError::Validation(
                "Category name is required".to_string(),
            ));
        }
        if name.chars().count() > MAX_CATEGORY_NAME {
            return Err(ContentError::Validation(format!(
                "Category name must be at most {MAX_CATEGORY_NAME} characters"
            )));
        }
        Ok(name.to_string())
    }

    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Category as joined onto a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
}

/// One (post, category) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCategory {
    pub post_id: PostId,
    pub category_id: CategoryId,
    /// Denormalized category name, rewritten on rename
    pub category_name: String,
    /// Copy of the post's visibility
    pub visibility: Option<Visibility>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_validation() {
        assert_eq!(Category::new("  Derecho Penal ").unwrap().name, "Derecho Penal");
        assert!(Category::new("   ").is_err());
        assert!(Category::new(&"x".repeat(101)).is_err());
    }
}
