pub mod rate_limiter;
pub mod redis_store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    entities::rate_limit::{RateLimitDecision, RateLimitPolicy},
    errors::RateLimitStoreError,
    repositories::rate_limit::RateLimitStore,
    settings::RateLimitConfig,
};

pub use rate_limiter::InMemoryRateLimitStore;
pub use redis_store::RedisRateLimitStore;

/// Store selected at startup: Redis when a URL is configured, memory otherwise.
#[derive(Clone)]
pub enum RateLimitBackend {
    Memory(InMemoryRateLimitStore),
    Redis(RedisRateLimitStore),
}

impl RateLimitBackend {
    pub fn from_config(config: &RateLimitConfig) -> Result<Self, RateLimitStoreError> {
        match config.redis_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(RateLimitBackend::Redis(RedisRateLimitStore::new(url)?)),
            _ => Ok(RateLimitBackend::Memory(InMemoryRateLimitStore::new())),
        }
    }
}

#[async_trait]
impl RateLimitStore for RateLimitBackend {
    async fn hit(
        &self,
        identifier: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, RateLimitStoreError> {
        match self {
            RateLimitBackend::Memory(store) => store.hit(identifier, policy, now).await,
            RateLimitBackend::Redis(store) => store.hit(identifier, policy, now).await,
        }
    }

    async fn prune(&self, now: DateTime<Utc>) -> Result<usize, RateLimitStoreError> {
        match self {
            RateLimitBackend::Memory(store) => store.prune(now).await,
            RateLimitBackend::Redis(store) => store.prune(now).await,
        }
    }

    async fn check_connection(&self) -> Result<(), RateLimitStoreError> {
        match self {
            RateLimitBackend::Memory(store) => store.check_connection().await,
            RateLimitBackend::Redis(store) => store.check_connection().await,
        }
    }

    fn backend_name(&self) -> &'static str {
        match self {
            RateLimitBackend::Memory(store) => store.backend_name(),
            RateLimitBackend::Redis(store) => store.backend_name(),
        }
    }
}
