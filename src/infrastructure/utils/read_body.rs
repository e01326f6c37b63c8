use actix_web::web;
use futures_util::StreamExt;

use crate::errors::{AppError, FieldError};

/// Collects a request body, refusing anything larger than `limit` bytes.
/// An oversized body is a validation error rather than a transport-level 413.
pub async fn read_body(payload: &mut web::Payload, limit: usize) -> Result<web::Bytes, AppError> {
    let mut body = web::BytesMut::new();

    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| {
            tracing::warn!("Failed to read request body: {}", e);
            AppError::InternalError(format!("Failed to read request body: {}", e))
        })?;

        if body.len() + chunk.len() > limit {
            tracing::info!(limit, "Request body exceeds size limit");
            return Err(AppError::ValidationError(vec![
                FieldError::new("body", "Request body is too large"),
            ]));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body.freeze())
}
