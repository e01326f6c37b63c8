use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use crate::{repositories::rate_limit::RateLimitStore, use_cases::rate_limit::RateLimiter};

/// Periodically drops rate limit records whose window has ended.
pub async fn start_prune_task<S>(limiter: RateLimiter<S>, every: Duration)
where
    S: RateLimitStore + 'static,
{
    let mut interval = interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        match limiter.prune().await {
            Ok(0) => {}
            Ok(count) => tracing::info!("Pruned {} expired rate limit records", count),
            Err(e) => tracing::error!("Rate limit prune failed: {}", e)
        }
    }
}
