use std::{fmt, sync::Arc};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::{
    entities::email::OutgoingEmail,
    errors::EmailError,
    repositories::mailer::EmailSender,
    settings::EmailConfig,
};

/// Transactional email through the Resend HTTP API.
#[derive(Clone)]
pub struct ResendMailer {
    client: Client,
    api_key: Arc<Zeroizing<String>>,
    endpoint: Url,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    reply_to: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

impl ResendMailer {
    pub fn new(api_key: &str, api_base_url: &str, timeout: std::time::Duration) -> Result<Self, EmailError> {
        let mut base = Url::parse(api_base_url)
            .map_err(|e| EmailError::InvalidConfig(format!("api_base_url: {}", e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("emails")
            .map_err(|e| EmailError::InvalidConfig(format!("api_base_url: {}", e)))?;

        // Timeouts surface as EmailError::Timeout and fail the dispatch
        let client = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(ResendMailer {
            client,
            api_key: Arc::new(Zeroizing::new(api_key.trim().to_string())),
            endpoint,
        })
    }

    /// Returns `None` when no API key is configured.
    pub fn from_config(config: &EmailConfig) -> Result<Option<Self>, EmailError> {
        match config.resend_api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {
                Self::new(key, &config.api_base_url, config.timeout).map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl EmailSender for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, EmailError> {
        let payload = SendEmailRequest {
            from: &email.from,
            to: [&email.to],
            reply_to: &email.reply_to,
            subject: &email.subject,
            text: &email.text,
            html: &email.html,
        };

        let response = self.client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.as_str())
            .header("Idempotency-Key", Uuid::new_v4().to_string())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let sent: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| EmailError::InvalidResponse(e.to_string()))?;

        Ok(sent.id)
    }
}

impl fmt::Debug for ResendMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResendMailer")
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}
