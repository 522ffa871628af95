//! Application Configuration
//!
//! Configuration for the Content application layer.

use crate::domain::value_object::excerpt::DEFAULT_EXCERPT_LEN;

/// Content application configuration
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// Characters kept when deriving an excerpt from content
    pub excerpt_length: usize,
    /// Upper bound for any requested `limit`
    pub max_page_size: u32,
    pub default_page_size: u32,
    pub default_recommended: u32,
    pub default_latest: u32,
    /// Key prefix for uploaded post images
    pub image_prefix: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            excerpt_length: DEFAULT_EXCERPT_LEN,
            max_page_size: 100,
            default_page_size: 10,
            default_recommended: 3,
            default_latest: 5,
            image_prefix: "posts".to_string(),
        }
    }
}

impl ContentConfig {
    /// Smaller pages so pagination is visible against the demo dataset
    pub fn development() -> Self {
        Self {
            default_page_size: 6,
            ..Default::default()
        }
    }

    /// Requested limit, defaulted and capped for HTTP callers. Zero stays
    /// zero and yields an empty page.
    pub fn clamp_limit(&self, limit: Option<u32>, default: u32) -> u32 {
        limit.unwrap_or(default).min(self.max_page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        let config = ContentConfig::default();
        assert_eq!(config.clamp_limit(None, config.default_page_size), 10);
        assert_eq!(config.clamp_limit(Some(0), 10), 0);
        assert_eq!(config.clamp_limit(Some(1_000), 10), 100);
    }
}
