use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Contact form limits, counted in characters after trimming.
pub const NAME_MIN: usize = 1;
pub const NAME_MAX: usize = 100;
pub const MESSAGE_MIN: usize = 10;
pub const MESSAGE_MAX: usize = 1000;

pub const DEFAULT_MAX_REQUESTS: u32 = 5;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60 * 60;
pub const DEFAULT_PRUNE_INTERVAL_SECS: u64 = 10 * 60;
pub const DEFAULT_EMAIL_TIMEOUT_SECS: u64 = 10;

pub const CONTACT_PAYLOAD_LIMIT: usize = 16 * 1024;

pub const RATE_LIMIT_LIMIT_HEADER: &str = "X-RateLimit-Limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "X-RateLimit-Remaining";

/// Client identifier used when neither a forwarded-for header nor a peer address is available.
pub const UNKNOWN_CLIENT: &str = "unknown";
