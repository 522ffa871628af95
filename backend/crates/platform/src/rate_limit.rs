//! Rate Limiting Infrastructure
//!
//! Fixed-window attempt counters keyed by an arbitrary string. Auth uses
//! them to cap TOTP verification attempts per user and factor.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::sync::Mutex;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Attempts allowed inside one window
    pub max_attempts: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_attempts: u32, window_secs: u64) -> Self {
        Self {
            max_attempts,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Outcome of one counted attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

impl RateLimitResult {
    /// Whole seconds until the window resets, at least 1
    pub fn retry_after_secs(&self, now_ms: i64) -> u64 {
        let ms = self.reset_at_ms.saturating_sub(now_ms).max(0);
        u64::try_from(ms).unwrap_or(0).div_ceil(1000).max(1)
    }
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Rate limit store unavailable: {0}")]
    Unavailable(String),
}

/// Storage backend for attempt counters
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Count one attempt under `key`; `allowed` is false once the window
    /// already holds `max_attempts`
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError>;

    /// Forget the counter, e.g. after a successful attempt
    async fn reset(&self, key: &str) -> Result<(), RateLimitError>;
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u32,
    window_start_ms: i64,
}

/// In-process counters. Sufficient for a single API instance.
#[derive(Debug, Clone, Default)]
pub struct MemoryRateLimitStore {
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn count_at(&self, key: &str, config: &RateLimitConfig, now_ms: i64) -> RateLimitResult {
        let mut buckets = self.buckets.lock().await;
        let window_ms = config.window_ms();

        // Drop windows that ended so the map does not grow without bound
        buckets.retain(|_, b| now_ms - b.window_start_ms < window_ms);

        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            count: 0,
            window_start_ms: now_ms,
        });
        let reset_at_ms = bucket.window_start_ms.saturating_add(window_ms);

        if bucket.count >= config.max_attempts {
            return RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_at_ms,
            };
        }

        bucket.count += 1;
        RateLimitResult {
            allowed: true,
            remaining: config.max_attempts - bucket.count,
            reset_at_ms,
        }
    }
}

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

impl RateLimitStore for MemoryRateLimitStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError> {
        Ok(self.count_at(key, config, now_ms()).await)
    }

    async fn reset(&self, key: &str) -> Result<(), RateLimitError> {
        self.buckets.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_window_cutoff() {
        let store = MemoryRateLimitStore::new();
        let config = RateLimitConfig::new(3, 60);

        for remaining in [2, 1, 0] {
            let result = store.count_at("mfa:a", &config, 1_000).await;
            assert!(result.allowed);
            assert_eq!(result.remaining, remaining);
        }

        let blocked = store.count_at("mfa:a", &config, 2_000).await;
        assert!(!blocked.allowed);
        assert_eq!(blocked.reset_at_ms, 61_000);
        assert_eq!(blocked.retry_after_secs(2_000), 59);

        // Other keys keep their own counter
        assert!(store.count_at("mfa:b", &config, 2_000).await.allowed);

        // A new window starts once the old one has passed
        let fresh = store.count_at("mfa:a", &config, 61_000).await;
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 2);
    }

    #[tokio::test]
    async fn test_reset_clears_counter() {
        let store = MemoryRateLimitStore::new();
        let config = RateLimitConfig::new(1, 60);

        assert!(RateLimitStore::check_and_increment(&store, "k", &config).await.unwrap().allowed);
        assert!(!RateLimitStore::check_and_increment(&store, "k", &config).await.unwrap().allowed);

        RateLimitStore::reset(&store, "k").await.unwrap();
        assert!(RateLimitStore::check_and_increment(&store, "k", &config).await.unwrap().allowed);
    }
}
