//! Domain Layer
//!
//! Entities, value objects, the listing query and repository traits.

pub mod entity;
pub mod query;
pub mod repository;
pub mod value_object;

pub use entity::{
    Author, AuthorPatch, Category, CategoryRef, NewAuthor, NewPost, Post, PostCategory, PostPatch,
    PostWithRelations,
};
pub use query::{CategoryFilter, PostPage, PostQuery, UNCATEGORIZED, Window};
pub use repository::{AuthorRepository, CategoryRepository, ContentStore, PostRepository};
