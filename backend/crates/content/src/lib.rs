//! Content Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, listing query, repository traits
//! - `application/` - Use cases (reads degrade, writes fail loudly)
//! - `infra/` - Postgres repository and the in-memory demo mirror
//! - `presentation/` - HTTP handlers, DTOs, public and admin routers
//!
//! ## Features
//! - Posts with rich-text content, derived excerpts and slugs
//! - Categories with explicit "uncategorized" filtering
//! - Authors denormalized onto posts by name
//! - Paginated listing and search with a consistent total count
//! - Admin image upload through object storage

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::ContentConfig;
pub use error::{ContentError, ContentResult};
pub use infra::{memory::MemoryContentRepository, postgres::PgContentRepository};
pub use presentation::{ContentAppState, admin_router, public_router};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::query::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
