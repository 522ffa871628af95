//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, Base64, random tokens)
//! - Signed session tokens
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Cookie and bearer-token extraction
//! - Object storage for uploaded images
//! - Fixed-window attempt counters

pub mod cookie;
pub mod crypto;
pub mod password;
pub mod rate_limit;
pub mod storage;
pub mod token;
