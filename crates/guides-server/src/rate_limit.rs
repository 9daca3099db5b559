/// Fixed-window request limiter for mutation endpoints.
///
/// Counters live behind a [`CounterStore`]. With Redis configured, windows are shared
/// across processes; without it (or while it is down) each process counts on its own.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::http::HeaderMap;
use tokio::sync::Mutex;
use tracing::warn;

use guides_common::redis::RedisCache;

const HOUR_MS: u64 = 60 * 60 * 1000;
const KEY_PREFIX: &str = "gds:v1:rl:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub count: u32,
    pub reset_at_ms: i64,
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Count one hit for `key` and return the window it landed in.
    async fn hit(&self, key: &str, now_ms: i64, window_ms: u64) -> WindowState;
}

#[derive(Default)]
pub struct MemoryCounterStore {
    windows: Mutex<HashMap<String, WindowState>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn hit(&self, key: &str, now_ms: i64, window_ms: u64) -> WindowState {
        let mut windows = self.windows.lock().await;
        let window = windows
            .entry(key.to_string())
            .and_modify(|w| {
                if w.reset_at_ms < now_ms {
                    *w = WindowState {
                        count: 0,
                        reset_at_ms: now_ms + window_ms as i64,
                    };
                }
            })
            .or_insert(WindowState {
                count: 0,
                reset_at_ms: now_ms + window_ms as i64,
            });
        window.count += 1;
        *window
    }
}

/// Redis-backed counters. Falls back to an in-process store whenever Redis errors.
pub struct RedisCounterStore {
    redis: RedisCache,
    fallback: MemoryCounterStore,
}

impl RedisCounterStore {
    pub fn new(redis: RedisCache) -> Self {
        Self {
            redis,
            fallback: MemoryCounterStore::new(),
        }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn hit(&self, key: &str, now_ms: i64, window_ms: u64) -> WindowState {
        match self.redis.incr_window(&format!("{KEY_PREFIX}{key}"), window_ms).await {
            Ok((count, ttl_ms)) => WindowState {
                count: u32::try_from(count).unwrap_or(u32::MAX),
                // PTTL is negative if the key somehow lost its expiry.
                reset_at_ms: now_ms + if ttl_ms > 0 { ttl_ms } else { window_ms as i64 },
            },
            Err(e) => {
                warn!(error = %e, key, "redis rate limit counter failed, counting in memory");
                self.fallback.hit(key, now_ms, window_ms).await
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub action: &'static str,
    pub limit: u32,
    pub window_ms: u64,
}

impl RateLimitPolicy {
    pub const CREATE: Self = Self::hourly("admin-guides-create", 20);
    pub const UPDATE: Self = Self::hourly("admin-guides-update", 60);
    pub const DELETE: Self = Self::hourly("admin-guides-delete", 30);
    pub const PREVIEW: Self = Self::hourly("mdx-preview", 120);

    const fn hourly(action: &'static str, limit: u32) -> Self {
        Self {
            action,
            limit,
            window_ms: HOUR_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    clock: Clock,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self::with_clock(store, Arc::new(now_ms))
    }

    pub fn with_clock(store: Arc<dyn CounterStore>, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// In-process counters only.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCounterStore::new()))
    }

    /// Count a request by `identity` against `policy`.
    pub async fn check(&self, policy: RateLimitPolicy, identity: &str) -> RateLimitDecision {
        let key = format!("{}:{identity}", policy.action);
        let window = self.store.hit(&key, (self.clock)(), policy.window_ms).await;
        RateLimitDecision {
            allowed: window.count <= policy.limit,
            remaining: policy.limit.saturating_sub(window.count),
            reset_at_ms: window.reset_at_ms,
        }
    }
}

/// Best-effort client address: first `x-forwarded-for` hop, then `x-real-ip`.
pub fn client_identity(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    forwarded
        .or_else(real_ip)
        .unwrap_or("unknown")
        .to_string()
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use axum::http::HeaderValue;

    use super::*;

    const POLICY: RateLimitPolicy = RateLimitPolicy {
        action: "test",
        limit: 5,
        window_ms: 1_000,
    };

    fn limiter_at(time: Arc<AtomicI64>) -> RateLimiter {
        RateLimiter::with_clock(
            Arc::new(MemoryCounterStore::new()),
            Arc::new(move || time.load(Ordering::SeqCst)),
        )
    }

    #[tokio::test]
    async fn sixth_request_in_window_is_denied() {
        let time = Arc::new(AtomicI64::new(10_000));
        let limiter = limiter_at(time);

        for expected_remaining in (0..5).rev() {
            let decision = limiter.check(POLICY, "1.2.3.4").await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
            assert_eq!(decision.reset_at_ms, 11_000);
        }
        let denied = limiter.check(POLICY, "1.2.3.4").await;
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);

        assert!(limiter.check(POLICY, "5.6.7.8").await.allowed, "identities are independent");
    }

    #[tokio::test]
    async fn window_resets_after_expiry() {
        let time = Arc::new(AtomicI64::new(0));
        let limiter = limiter_at(time.clone());
        for _ in 0..6 {
            limiter.check(POLICY, "client").await;
        }
        assert!(!limiter.check(POLICY, "client").await.allowed);

        // Still inside the window at exactly reset_at.
        time.store(1_000, Ordering::SeqCst);
        assert!(!limiter.check(POLICY, "client").await.allowed);

        time.store(1_001, Ordering::SeqCst);
        let decision = limiter.check(POLICY, "client").await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
        assert_eq!(decision.reset_at_ms, 2_001);
    }

    #[tokio::test]
    async fn actions_are_counted_separately() {
        let limiter = limiter_at(Arc::new(AtomicI64::new(0)));
        let other = RateLimitPolicy { action: "other", ..POLICY };
        for _ in 0..5 {
            limiter.check(POLICY, "client").await;
        }
        assert!(!limiter.check(POLICY, "client").await.allowed);
        assert!(limiter.check(other, "client").await.allowed);
    }

    #[tokio::test]
    async fn redis_store_falls_back_to_memory() {
        let store = RedisCounterStore::new(RedisCache::disabled());
        assert_eq!(store.hit("k", 0, 100).await, WindowState { count: 1, reset_at_ms: 100 });
        assert_eq!(store.hit("k", 50, 100).await.count, 2);
    }

    #[test]
    fn identity_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_identity(&headers), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_identity(&headers), "10.0.0.2");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));
        assert_eq!(client_identity(&headers), "203.0.113.7");
    }
}
