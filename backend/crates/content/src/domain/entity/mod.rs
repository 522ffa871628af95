//! Domain Entities

pub mod author;
pub mod category;
pub mod post;

pub use author::{Author, AuthorPatch, NewAuthor};
pub use category::{Category, CategoryRef, PostCategory};
pub use post::{NewPost, Post, PostPatch, PostWithRelations};
