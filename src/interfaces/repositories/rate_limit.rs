use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    entities::rate_limit::{RateLimitDecision, RateLimitPolicy},
    errors::RateLimitStoreError,
};

/// Storage for per-identifier rate limit counters.
///
/// `hit` must perform the read-check-increment for one identifier atomically,
/// so concurrent requests from the same client can never push the count past
/// `policy.max_requests`.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn hit(
        &self,
        identifier: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, RateLimitStoreError>;

    /// Drops records whose window ended before `now`. Returns how many were removed.
    async fn prune(&self, now: DateTime<Utc>) -> Result<usize, RateLimitStoreError>;

    async fn check_connection(&self) -> Result<(), RateLimitStoreError>;

    fn backend_name(&self) -> &'static str;
}
