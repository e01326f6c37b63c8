use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use deadpool_redis::{Config, Pool, Runtime};
use once_cell::sync::Lazy;
use redis::Script;

use crate::{
    entities::rate_limit::{RateLimitDecision, RateLimitPolicy},
    errors::RateLimitStoreError,
    repositories::rate_limit::RateLimitStore,
};

const KEY_PREFIX: &str = "rl:contact";

// KEYS[1] = counter key, ARGV[1] = max requests, ARGV[2] = window in ms.
// Returns {allowed, count, ttl_ms}. A full window is reported without INCR.
static FIXED_WINDOW: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local current = tonumber(redis.call('GET', KEYS[1]) or '0')
        if current >= tonumber(ARGV[1]) then
            return {0, current, redis.call('PTTL', KEYS[1])}
        end
        local count = redis.call('INCR', KEYS[1])
        if count == 1 then
            redis.call('PEXPIRE', KEYS[1], ARGV[2])
        end
        return {1, count, redis.call('PTTL', KEYS[1])}
        "#,
    )
});

/// Fixed-window counters shared by every instance through Redis.
/// Windows expire through key TTLs, so nothing needs pruning.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    pool: Pool,
}

impl RedisRateLimitStore {
    pub fn new(redis_url: &str) -> Result<Self, RateLimitStoreError> {
        let pool = Config::from_url(redis_url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| RateLimitStoreError::Unavailable(e.to_string()))?;

        Ok(RedisRateLimitStore { pool })
    }

    fn key(identifier: &str) -> String {
        // URL-encode to keep arbitrary header values key-safe
        format!("{}:{}", KEY_PREFIX, urlencoding::encode(identifier))
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn hit(
        &self,
        identifier: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, RateLimitStoreError> {
        let mut conn = self.pool.get().await?;

        let (allowed, count, ttl_ms): (i64, i64, i64) = FIXED_WINDOW
            .key(Self::key(identifier))
            .arg(policy.max_requests)
            .arg(policy.window_millis())
            .invoke_async(&mut conn)
            .await?;

        let ttl = if ttl_ms > 0 {
            TimeDelta::milliseconds(ttl_ms)
        } else {
            policy.window
        };
        let count = u32::try_from(count).unwrap_or(u32::MAX);

        Ok(RateLimitDecision {
            allowed: allowed == 1,
            limit: policy.max_requests,
            remaining: if allowed == 1 {
                policy.max_requests.saturating_sub(count)
            } else {
                0
            },
            reset_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        })
    }

    async fn prune(&self, _now: DateTime<Utc>) -> Result<usize, RateLimitStoreError> {
        Ok(0)
    }

    async fn check_connection(&self) -> Result<(), RateLimitStoreError> {
        let mut conn = self.pool.get().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(RateLimitStoreError::Operation(format!("Unexpected PING reply: {}", pong)))
        }
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
