//! Application Layer
//!
//! Use cases and application services. Reads degrade to empty results,
//! writes return their errors.

pub mod authors;
pub mod categories;
pub mod config;
pub mod images;
pub mod read_posts;
pub mod write_posts;

// Re-exports
pub use authors::AuthorsUseCase;
pub use categories::CategoriesUseCase;
pub use config::ContentConfig;
pub use images::ImagesUseCase;
pub use read_posts::{PageRequest, ReadPostsUseCase};
pub use write_posts::WritePostsUseCase;
