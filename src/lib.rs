use anyhow::Context;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;
pub mod telemetry;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, routes};
pub use infrastructure::{limiter, mail, utils, web};

use entities::rate_limit::RateLimitPolicy;
use limiter::RateLimitBackend;
use mail::resend::ResendMailer;
use use_cases::{contact::ContactHandler, rate_limit::RateLimiter};

pub struct AppState {
    pub contact_handler: AppContactHandler,
    pub trust_x_forwarded_for: bool,
}

pub type AppContactHandler = ContactHandler<RateLimitBackend, ResendMailer>;

impl AppState {
    pub fn new(config: &settings::AppConfig) -> anyhow::Result<Self> {
        let store = RateLimitBackend::from_config(&config.rate_limit)
            .context("Failed to initialise rate limit store")?;
        let policy = RateLimitPolicy::new(config.rate_limit.max_requests, config.rate_limit.window);

        let mailer = ResendMailer::from_config(&config.email)
            .context("Failed to initialise email provider")?;
        if mailer.is_none() {
            tracing::warn!("No email API key configured; contact submissions will return 503");
        }

        let contact_handler = ContactHandler::new(
            RateLimiter::new(store, policy),
            mailer,
            config.email.from_address.clone(),
            config.email.to_address.clone(),
        );

        Ok(AppState {
            contact_handler,
            trust_x_forwarded_for: config.trust_x_forwarded_for,
        })
    }
}
