use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::{ContentType, RETRY_AFTER}, StatusCode},
    HttpResponse
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use crate::constants::{RATE_LIMIT_LIMIT_HEADER, RATE_LIMIT_REMAINING_HEADER};

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    RateLimitExceeded { limit: u32, retry_after_secs: u64 },
    ServiceUnavailable(String),
    DispatchFailure(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::RateLimitExceeded { limit, retry_after_secs } => {
                write!(f, "Rate limit of {} exceeded, retry in {}s", limit, retry_after_secs)
            }
            AppError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            AppError::DispatchFailure(msg) => write!(f, "Email dispatch failed: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        builder.insert_header(ContentType::json());

        // 5xx bodies stay generic; the detail lives in the server log only.
        match self {
            AppError::ValidationError(errors) => builder.json(serde_json::json!({
                "message": "Invalid input",
                "errors": errors
            })),
            AppError::RateLimitExceeded { limit, retry_after_secs } => builder
                .insert_header((RATE_LIMIT_LIMIT_HEADER, limit.to_string()))
                .insert_header((RATE_LIMIT_REMAINING_HEADER, "0"))
                .insert_header((RETRY_AFTER, retry_after_secs.to_string()))
                .json(serde_json::json!({
                    "message": "Too many requests. Please try again later."
                })),
            AppError::ServiceUnavailable(_) => builder.json(serde_json::json!({
                "message": "Contact form is temporarily unavailable."
            })),
            AppError::DispatchFailure(_) | AppError::InternalError(_) => builder.json(serde_json::json!({
                "message": "An error occurred. Please try again later."
            })),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DispatchFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Flattens `validator` output into one `FieldError` per violated rule.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(|e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "Invalid value".to_string()),
            })
        })
        .collect()
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalError(format!("Malformed request body: {}", err))
    }
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        AppError::DispatchFailure(err.to_string())
    }
}

impl From<RateLimitStoreError> for AppError {
    fn from(err: RateLimitStoreError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

#[derive(Debug, Display)]
pub enum EmailError {
    #[display("Email provider request timed out")]
    Timeout,

    #[display("Email provider transport error: {_0}")]
    Transport(String),

    #[display("Email provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[display("Unexpected email provider response: {_0}")]
    InvalidResponse(String),

    #[display("Invalid email provider configuration: {_0}")]
    InvalidConfig(String),
}

impl std::error::Error for EmailError {}

impl From<reqwest::Error> for EmailError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EmailError::Timeout
        } else {
            EmailError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Display)]
pub enum RateLimitStoreError {
    #[display("Rate limit store unavailable: {_0}")]
    Unavailable(String),

    #[display("Rate limit store operation failed: {_0}")]
    Operation(String),
}

impl std::error::Error for RateLimitStoreError {}

impl From<redis::RedisError> for RateLimitStoreError {
    fn from(err: redis::RedisError) -> Self {
        RateLimitStoreError::Operation(err.to_string())
    }
}

impl From<deadpool_redis::PoolError> for RateLimitStoreError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        RateLimitStoreError::Unavailable(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}
