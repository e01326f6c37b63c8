use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use dotenv::dotenv;
use std::{env, fmt, str::FromStr, time::Duration};
use url::Url;

use crate::constants::{
    DEFAULT_EMAIL_TIMEOUT_SECS, DEFAULT_MAX_REQUESTS, DEFAULT_PRUNE_INTERVAL_SECS,
    DEFAULT_RATE_LIMIT_WINDOW_SECS,
};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

impl AppEnvironment {
    /// Reads `APP_ENV`, defaulting to development.
    pub fn current() -> Result<Self, ConfigError> {
        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default = "default_true")]
    pub trust_x_forwarded_for: bool,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    #[serde(default = "default_window", deserialize_with = "human_duration")]
    pub window: Duration,

    #[serde(default = "default_prune_interval", deserialize_with = "human_duration")]
    pub prune_interval: Duration,

    /// When set, counters live in Redis and are shared between instances.
    #[serde(default)]
    pub redis_url: Option<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            max_requests: default_max_requests(),
            window: default_window(),
            prune_interval: default_prune_interval(),
            redis_url: None,
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct EmailConfig {
    #[serde(default)]
    pub resend_api_key: Option<String>,

    #[serde(default = "default_from_address")]
    pub from_address: String,

    #[serde(default)]
    pub to_address: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_email_timeout", deserialize_with = "human_duration")]
    pub timeout: Duration,
}

impl Default for EmailConfig {
    fn default() -> Self {
        EmailConfig {
            resend_api_key: None,
            from_address: default_from_address(),
            to_address: String::new(),
            api_base_url: default_api_base_url(),
            timeout: default_email_timeout(),
        }
    }
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        self.resend_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-Contact".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_true() -> bool {
    true
}
fn default_max_requests() -> u32 {
    DEFAULT_MAX_REQUESTS
}
fn default_window() -> Duration {
    Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS)
}
fn default_prune_interval() -> Duration {
    Duration::from_secs(DEFAULT_PRUNE_INTERVAL_SECS)
}
fn default_from_address() -> String {
    "Portfolio Contact <onboarding@resend.dev>".to_string()
}
fn default_api_base_url() -> String {
    "https://api.resend.com".to_string()
}
fn default_email_timeout() -> Duration {
    Duration::from_secs(DEFAULT_EMAIL_TIMEOUT_SECS)
}

/// Accepts humantime strings such as `"1h"` or `"90s"`.
fn human_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let env_name = AppEnvironment::current()?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .ignore_empty(true)
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Fall back to the provider's conventional variable names
        if !config.email.is_configured() {
            config.email.resend_api_key = env::var("RESEND_API_KEY").ok();
        }
        if config.email.to_address.trim().is_empty() {
            config.email.to_address = env::var("CONTACT_EMAIL").unwrap_or_default();
        }
        if config.rate_limit.redis_url.is_none() {
            config.rate_limit.redis_url = env::var("APP_REDIS_URL").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.rate_limit.max_requests == 0 {
            errors.push("RATE_LIMIT__MAX_REQUESTS must be greater than zero");
        }
        if self.rate_limit.window.is_zero() {
            errors.push("RATE_LIMIT__WINDOW must be greater than zero");
        }
        if self.rate_limit.prune_interval.is_zero() {
            errors.push("RATE_LIMIT__PRUNE_INTERVAL must be greater than zero");
        }
        if Url::parse(&self.email.api_base_url).is_err() {
            errors.push("EMAIL__API_BASE_URL must be a valid URL");
        }
        if self.email.is_configured() && self.email.to_address.trim().is_empty() {
            errors.push("EMAIL__TO_ADDRESS must be set when an email API key is configured");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for Option<String> {
    fn redact(&self) -> &str {
        match self.as_deref() {
            None => "[MISSING]",
            Some(s) if s.trim().is_empty() => "[MISSING]",
            Some(_) => "[REDACTED]",
        }
    }
}

impl fmt::Debug for RateLimitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitConfig")
            .field("max_requests", &self.max_requests)
            .field("window", &humantime::format_duration(self.window).to_string())
            .field("prune_interval", &humantime::format_duration(self.prune_interval).to_string())
            .field("redis_url", &self.redis_url.redact())
            .finish()
    }
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("resend_api_key", &self.resend_api_key.redact())
            .field("from_address", &self.from_address)
            .field("to_address", &self.to_address)
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &humantime::format_duration(self.timeout).to_string())
            .finish()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("trust_x_forwarded_for", &self.trust_x_forwarded_for)
            .field("rate_limit", &self.rate_limit)
            .field("email", &self.email)
            .finish()
    }
}
