use chrono::{DateTime, Utc};

use crate::{
    entities::rate_limit::{RateLimitDecision, RateLimitPolicy},
    errors::RateLimitStoreError,
    repositories::rate_limit::RateLimitStore,
};

/// Fixed-window rate limiter keyed by client identifier.
pub struct RateLimiter<S>
where
    S: RateLimitStore,
{
    pub store: S,
    policy: RateLimitPolicy,
}

impl<S> RateLimiter<S>
where
    S: RateLimitStore,
{
    pub fn new(store: S, policy: RateLimitPolicy) -> Self {
        RateLimiter { store, policy }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Counts one request from `identifier` against the current window
    pub async fn admit(&self, identifier: &str) -> Result<RateLimitDecision, RateLimitStoreError> {
        self.admit_at(identifier, Utc::now()).await
    }

    pub async fn admit_at(
        &self,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, RateLimitStoreError> {
        self.store.hit(identifier, &self.policy, now).await
    }

    pub async fn prune(&self) -> Result<usize, RateLimitStoreError> {
        self.store.prune(Utc::now()).await
    }
}
