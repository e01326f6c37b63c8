use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// Fixed-window limits applied to every client identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: TimeDelta,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        RateLimitPolicy {
            max_requests,
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn window_millis(&self) -> i64 {
        self.window.num_milliseconds()
    }

    fn window_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Per-identifier counter for the active window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

impl RateLimitRecord {
    /// Opens a fresh window with this request counted.
    pub fn start(now: DateTime<Utc>, policy: &RateLimitPolicy) -> Self {
        RateLimitRecord {
            count: 1,
            window_reset_at: policy.window_end(now),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.window_reset_at
    }

    /// Counts one request against this record.
    ///
    /// An expired record is replaced by a fresh window. A full window rejects
    /// the request and leaves the record untouched.
    pub fn hit(&mut self, now: DateTime<Utc>, policy: &RateLimitPolicy) -> RateLimitDecision {
        if self.is_expired(now) {
            *self = RateLimitRecord::start(now, policy);
            return self.admitted(policy);
        }

        if self.count >= policy.max_requests {
            return RateLimitDecision {
                allowed: false,
                limit: policy.max_requests,
                remaining: 0,
                reset_at: self.window_reset_at,
            };
        }

        self.count += 1;
        self.admitted(policy)
    }

    pub fn admitted(&self, policy: &RateLimitPolicy) -> RateLimitDecision {
        RateLimitDecision {
            allowed: true,
            limit: policy.max_requests,
            remaining: policy.max_requests.saturating_sub(self.count),
            reset_at: self.window_reset_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, never less than one.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = self.reset_at.signed_duration_since(now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000).max(1)
    }
}
