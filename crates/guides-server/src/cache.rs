/// Redis cache for compiled guide bodies.
///
/// Key schema:
/// - `gds:v1:html:{sha256(body)}`: compiled HTML (TTL: 24h)
///
/// Keys are content-addressed, so an edited guide simply misses and stale entries age
/// out. Every operation degrades to a miss when Redis is unavailable.
use sha2::{Digest, Sha256};
use tracing::debug;

use guides_common::redis::RedisCache;

const KEY_PREFIX: &str = "gds:v1:";
const HTML_TTL_SECS: u64 = 86_400;

pub struct HtmlCache {
    redis: RedisCache,
}

impl HtmlCache {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }

    pub fn disabled() -> Self {
        Self::new(RedisCache::disabled())
    }

    pub async fn get(&self, body: &str) -> Option<String> {
        if !self.redis.is_configured() {
            return None;
        }
        let html = self.redis.get(&html_key(body)).await;
        if html.is_some() {
            debug!("compiled html cache hit");
        }
        html
    }

    pub async fn set(&self, body: &str, html: &str) {
        if self.redis.is_configured() {
            self.redis.set_with_ttl(&html_key(body), html, HTML_TTL_SECS).await;
        }
    }
}

/// Hex SHA-256 of `text`.
pub fn digest(text: &str) -> String {
    let hash = Sha256::digest(text.as_bytes());
    format!("{hash:x}")
}

fn html_key(body: &str) -> String {
    format!("{KEY_PREFIX}html:{}", digest(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex() {
        let a = digest("hello");
        assert_eq!(a.len(), 64);
        assert_eq!(
            a,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_ne!(digest("hello "), a);
    }

    #[test]
    fn keys_are_namespaced() {
        assert!(html_key("body").starts_with("gds:v1:html:"));
    }

    #[tokio::test]
    async fn disabled_cache_always_misses() {
        let cache = HtmlCache::disabled();
        cache.set("body", "<p>body</p>").await;
        assert_eq!(cache.get("body").await, None);
    }
}
