/// Redis wrapper with graceful degradation.
///
/// Cache operations return `Option<T>`/`bool`: on any Redis error they log a warning and
/// report a miss, so callers fall through to compute from source. Counter operations
/// return a `Result` so the rate limiter can decide how to degrade.
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::warn;

use crate::error::CommonError;

#[derive(Clone)]
pub struct RedisCache {
    client: Option<redis::Client>,
}

impl RedisCache {
    /// Build a client for `url`. A `None` URL or an invalid one yields a cache that
    /// always misses.
    pub fn new(url: Option<&str>) -> Self {
        let client = url.and_then(|u| {
            redis::Client::open(u)
                .inspect_err(|e| warn!(error = %e, url = u, "failed to create redis client, redis disabled"))
                .ok()
        });
        Self { client }
    }

    /// A cache with no backing client.
    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Send a PING. Returns `true` if Redis is reachable.
    pub async fn is_available(&self) -> bool {
        let Ok(mut conn) = self.connection().await else {
            return false;
        };
        let result: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
        result.is_ok()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self
            .connection()
            .await
            .inspect_err(|e| warn!(error = %e, "redis connection failed"))
            .ok()?;
        conn.get::<_, Option<String>>(key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis GET failed"))
            .ok()?
    }

    /// Set a value with a TTL in seconds. Returns `true` if successful.
    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        let Ok(mut conn) = self
            .connection()
            .await
            .inspect_err(|e| warn!(error = %e, "redis connection failed"))
        else {
            return false;
        };
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SETEX failed"))
            .is_ok()
    }

    /// Count one hit against a fixed window stored at `key`.
    ///
    /// The key is created with a `window_ms` expiry on the first hit of a window and
    /// incremented on every hit. Returns `(count, remaining_ttl_ms)`.
    pub async fn incr_window(&self, key: &str, window_ms: u64) -> Result<(i64, i64), CommonError> {
        let mut conn = self.connection().await?;
        let (count, ttl_ms): (i64, i64) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(key)
            .arg(0)
            .arg("NX")
            .arg("PX")
            .arg(window_ms)
            .ignore()
            .cmd("INCR")
            .arg(key)
            .cmd("PTTL")
            .arg(key)
            .query_async(&mut conn)
            .await?;
        Ok((count, ttl_ms))
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CommonError> {
        let client = self.client.as_ref().ok_or(CommonError::RedisUnavailable)?;
        Ok(client.get_multiplexed_async_connection().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_cache_misses_and_reports_unavailable() {
        let cache = RedisCache::disabled();
        assert!(!cache.is_configured());
        assert!(!cache.is_available().await);
        assert_eq!(cache.get("gds:v1:anything").await, None);
        assert!(!cache.set_with_ttl("gds:v1:anything", "x", 10).await);
        assert!(matches!(
            cache.incr_window("rl:create:127.0.0.1", 1_000).await,
            Err(CommonError::RedisUnavailable)
        ));
    }

    #[test]
    fn invalid_url_disables_client() {
        let cache = RedisCache::new(Some("not a url"));
        assert!(!cache.is_configured());
    }
}
