use actix_web::{get, web, HttpResponse, Responder};
use humantime::format_duration;
use serde::Serialize;
use std::time::Duration;

use crate::{constants::START_TIME, repositories::rate_limit::RateLimitStore, AppState};

#[derive(Serialize, Clone)]
struct HealthCheckResponse {
    status: String,
    uptime: String,
    timestamp: String,
    started_at: String,
    version: String,
    email_provider: String,
    rate_limit_store: String,
}

async fn build_health_response(state: &AppState) -> HealthCheckResponse {
    let now_utc = chrono::Utc::now();
    let uptime_secs = now_utc.signed_duration_since(*START_TIME).num_seconds().max(0) as u64;
    let human_uptime = format_duration(Duration::from_secs(uptime_secs));

    let email_provider = if state.contact_handler.is_mailer_configured() {
        "configured"
    } else {
        "not configured"
    };

    let store = &state.contact_handler.rate_limiter.store;
    let rate_limit_store = match store.backend_name() {
        "memory" => "memory".to_string(),
        backend => match store.check_connection().await {
            Ok(()) => format!("{}: OK", backend),
            Err(e) => {
                tracing::warn!("Rate limit store health check failed: {}", e);
                format!("{}: unavailable", backend)
            }
        },
    };

    HealthCheckResponse {
        status: "healthy".to_string(),
        uptime: human_uptime.to_string(),
        timestamp: now_utc.to_rfc3339(),
        started_at: START_TIME.to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        email_provider: email_provider.to_string(),
        rate_limit_store,
    }
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(build_health_response(&state).await)
}
