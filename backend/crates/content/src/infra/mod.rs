//! Infrastructure Layer
//!
//! Repository implementations: PostgreSQL and the in-memory demo mirror.

pub mod memory;
pub mod postgres;
pub mod seed;

pub use memory::MemoryContentRepository;
pub use postgres::PgContentRepository;
pub use seed::{SeedData, demo_dataset};
