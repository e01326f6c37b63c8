use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    entities::{contact::ContactSubmission, email::OutgoingEmail, rate_limit::RateLimitDecision},
    errors::AppError,
    repositories::{mailer::EmailSender, rate_limit::RateLimitStore},
    use_cases::rate_limit::RateLimiter,
};

/// Result of a dispatched submission, with the caller's remaining quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub message_id: String,
    pub limit: u32,
    pub remaining: u32,
}

pub struct ContactHandler<S, M>
where
    S: RateLimitStore,
    M: EmailSender,
{
    pub rate_limiter: RateLimiter<S>,
    pub mailer: Option<M>,
    from_address: String,
    to_address: String,
}

impl<S, M> ContactHandler<S, M>
where
    S: RateLimitStore,
    M: EmailSender,
{
    pub fn new(
        rate_limiter: RateLimiter<S>,
        mailer: Option<M>,
        from_address: impl Into<String>,
        to_address: impl Into<String>,
    ) -> Self {
        ContactHandler {
            rate_limiter,
            mailer,
            from_address: from_address.into(),
            to_address: to_address.into(),
        }
    }

    pub fn is_mailer_configured(&self) -> bool {
        self.mailer.is_some()
    }

    /// Handles one contact form submission from `identifier`.
    pub async fn submit(&self, identifier: &str, body: &[u8]) -> Result<SubmissionReceipt, AppError> {
        self.submit_at(identifier, body, Utc::now()).await
    }

    /// Rate limit, parse, validate, then dispatch. Every failure comes back
    /// as an `AppError`; the quota is spent before the body is looked at.
    pub async fn submit_at(
        &self,
        identifier: &str,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, AppError> {
        let decision = self.check_rate_limit_at(identifier, now).await?;
        self.process(identifier, &decision, body).await
    }

    pub async fn check_rate_limit(&self, identifier: &str) -> Result<RateLimitDecision, AppError> {
        self.check_rate_limit_at(identifier, Utc::now()).await
    }

    /// Spends one unit of quota for `identifier`, failing with
    /// `RateLimitExceeded` once the window is full.
    pub async fn check_rate_limit_at(
        &self,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, AppError> {
        let decision = self.rate_limiter
            .admit_at(identifier, now)
            .await
            .map_err(|e| {
                tracing::error!(identifier, error = %e, "Rate limit check failed");
                AppError::from(e)
            })?;

        if !decision.allowed {
            tracing::warn!(identifier, limit = decision.limit, "Contact form rate limit exceeded");
            return Err(AppError::RateLimitExceeded {
                limit: decision.limit,
                retry_after_secs: decision.retry_after_secs(now),
            });
        }

        Ok(decision)
    }

    /// Parses, validates and dispatches a body whose request was already admitted.
    pub async fn process(
        &self,
        identifier: &str,
        decision: &RateLimitDecision,
        body: &[u8],
    ) -> Result<SubmissionReceipt, AppError> {
        let payload: Value = serde_json::from_slice(body).map_err(|e| {
            tracing::error!(identifier, error = %e, "Contact form body is not valid JSON");
            AppError::from(e)
        })?;

        let submission = ContactSubmission::parse(&payload).inspect_err(|e| {
            tracing::info!(identifier, error = %e, "Contact form rejected");
        })?;
        tracing::debug!(identifier, ?submission, "Contact form submission validated");

        let mailer = self.mailer.as_ref().ok_or_else(|| {
            tracing::error!("Contact form submitted but no email provider is configured");
            AppError::ServiceUnavailable("email provider is not configured".into())
        })?;

        let email = OutgoingEmail::from_submission(&submission, &self.from_address, &self.to_address);

        let message_id = mailer.send(&email).await.map_err(|e| {
            tracing::error!(identifier, error = %e, "Failed to dispatch contact email");
            AppError::from(e)
        })?;

        tracing::info!(identifier, message_id = %message_id, "Contact message dispatched");

        Ok(SubmissionReceipt {
            message_id,
            limit: decision.limit,
            remaining: decision.remaining,
        })
    }
}
