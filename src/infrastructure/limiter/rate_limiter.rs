use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    entities::rate_limit::{RateLimitDecision, RateLimitPolicy, RateLimitRecord},
    errors::RateLimitStoreError,
    repositories::rate_limit::RateLimitStore,
};

type Key = String;

/// Process-local fixed-window counters.
///
/// Each `hit` runs inside the DashMap entry guard, which holds the shard's
/// write lock for the whole check-and-increment.
#[derive(Clone, Default)]
pub struct InMemoryRateLimitStore {
    records: Arc<DashMap<Key, RateLimitRecord>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, identifier: &str) -> Option<RateLimitRecord> {
        self.records.get(identifier).map(|r| r.value().clone())
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(
        &self,
        identifier: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, RateLimitStoreError> {
        let decision = match self.records.entry(identifier.to_string()) {
            Entry::Occupied(mut entry) => entry.get_mut().hit(now, policy),
            Entry::Vacant(entry) => {
                let record = RateLimitRecord::start(now, policy);
                let decision = record.admitted(policy);
                entry.insert(record);
                decision
            }
        };

        Ok(decision)
    }

    async fn prune(&self, now: DateTime<Utc>) -> Result<usize, RateLimitStoreError> {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired(now));
        Ok(before.saturating_sub(self.records.len()))
    }

    async fn check_connection(&self) -> Result<(), RateLimitStoreError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
