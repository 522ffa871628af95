//! Value Object Module

pub mod excerpt;
pub mod ids;
pub mod name_order;
pub mod slug;
pub mod sort_order;
pub mod visibility;

pub use ids::{AuthorId, CategoryId, PostId};
pub use sort_order::SortOrder;
pub use visibility::{Visibility, VisibilityFilter};
