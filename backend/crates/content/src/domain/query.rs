//! Post listing query
//!
//! One query type drives every listing operation. The category filter keeps
//! the inner/outer distinction explicit:
//! - `Any`: no category restriction, uncategorized posts included
//! - `Category` / `AnyOf`: only posts associated with the category (inner join)
//! - `Uncategorized`: only posts with no association at all

use serde::{Deserialize, Serialize};

use crate::domain::entity::PostWithRelations;
use crate::domain::value_object::{CategoryId, PostId, SortOrder, VisibilityFilter};
use crate::error::{ContentError, ContentResult};

/// Literal accepted in place of a category id
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    Any,
    Category(CategoryId),
    AnyOf(Vec<CategoryId>),
    Uncategorized,
}

impl CategoryFilter {
    /// `None`/empty -> `Any`, `"uncategorized"` -> `Uncategorized`, else an id
    pub fn from_param(param: Option<&str>) -> ContentResult<Self> {
        match param.map(str::trim).filter(|p| !p.is_empty()) {
            None => Ok(CategoryFilter::Any),
            Some(p) if p.eq_ignore_ascii_case(UNCATEGORIZED) => Ok(CategoryFilter::Uncategorized),
            Some(p) => CategoryId::parse_str(p)
                .map(CategoryFilter::Category)
                .map_err(|_| ContentError::Validation(format!("Invalid category id: {p}"))),
        }
    }

    /// Whether a post with these category ids passes
    pub fn matches(&self, post_categories: &[CategoryId]) -> bool {
        match self {
            CategoryFilter::Any => true,
            CategoryFilter::Category(id) => post_categories.contains(id),
            CategoryFilter::AnyOf(ids) => post_categories.iter().any(|c| ids.contains(c)),
            CategoryFilter::Uncategorized => post_categories.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub visibility: VisibilityFilter,
    pub category: CategoryFilter,
    /// Case-insensitive substring of title or excerpt
    pub search: Option<String>,
    pub exclude: Vec<PostId>,
    pub sort: SortOrder,
    /// `None` returns the whole filtered set
    pub window: Option<Window>,
}

impl PostQuery {
    pub fn new(visibility: VisibilityFilter) -> Self {
        Self {
            visibility,
            ..Default::default()
        }
    }

    pub fn category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn search(mut self, term: Option<&str>) -> Self {
        self.search = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        self
    }

    pub fn excluding(mut self, ids: impl IntoIterator<Item = PostId>) -> Self {
        self.exclude.extend(ids);
        self
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.window = Some(Window { limit, offset });
        self
    }

    /// Search term lowercased for in-memory matching
    pub fn search_lower(&self) -> Option<String> {
        self.search.as_ref().map(|s| s.to_lowercase())
    }
}

/// One page of a filtered listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<PostWithRelations>,
    /// Size of the whole filtered set
    pub total_count: u64,
    pub has_more: bool,
}

impl PostPage {
    pub fn new(posts: Vec<PostWithRelations>, total_count: u64, window: Option<Window>) -> Self {
        let has_more = window
            .is_some_and(|w| u64::from(w.offset) + u64::from(w.limit) < total_count);
        Self {
            posts,
            total_count,
            has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_param() {
        assert_eq!(CategoryFilter::from_param(None).unwrap(), CategoryFilter::Any);
        assert_eq!(CategoryFilter::from_param(Some(" ")).unwrap(), CategoryFilter::Any);
        assert_eq!(
            CategoryFilter::from_param(Some("uncategorized")).unwrap(),
            CategoryFilter::Uncategorized
        );

        let id = CategoryId::new();
        assert_eq!(
            CategoryFilter::from_param(Some(&id.to_string())).unwrap(),
            CategoryFilter::Category(id)
        );
        assert!(CategoryFilter::from_param(Some("cat-1")).is_err());
    }

    #[test]
    fn test_filter_matches() {
        let a = CategoryId::new();
        let b = CategoryId::new();

        assert!(CategoryFilter::Any.matches(&[]));
        assert!(!CategoryFilter::Category(a).matches(&[]));
        assert!(CategoryFilter::Category(a).matches(&[b, a]));
        assert!(CategoryFilter::AnyOf(vec![a, b]).matches(&[b]));
        assert!(CategoryFilter::Uncategorized.matches(&[]));
        assert!(!CategoryFilter::Uncategorized.matches(&[a]));
    }

    #[test]
    fn test_has_more() {
        let window = Some(Window { limit: 2, offset: 0 });
        assert!(PostPage::new(vec![], 3, window).has_more);
        assert!(!PostPage::new(vec![], 2, window).has_more);
        assert!(!PostPage::new(vec![], 10, None).has_more);
    }
}
