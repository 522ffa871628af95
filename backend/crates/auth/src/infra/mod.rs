//! Infrastructure Layer
//!
//! Postgres for deployments, in-memory for demo mode and tests.

pub mod memory;
pub mod postgres;

pub use memory::MemoryAuthRepository;
pub use postgres::PgAuthRepository;
