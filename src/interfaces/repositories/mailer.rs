use async_trait::async_trait;

use crate::{entities::email::OutgoingEmail, errors::EmailError};

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Hands the message to the provider and returns the provider's message id.
    async fn send(&self, email: &OutgoingEmail) -> Result<String, EmailError>;
}
