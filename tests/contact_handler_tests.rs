use std::{io, sync::Arc, time::Duration};

use actix_web::{body::to_bytes, http::StatusCode, ResponseError};
use async_trait::async_trait;
use chrono::{TimeDelta, TimeZone, Utc};
use mockall::mock;
use parking_lot::Mutex;
use portfolio_contact::{
    entities::{contact::ContactSubmission, email::OutgoingEmail, rate_limit::RateLimitPolicy},
    errors::{AppError, EmailError},
    limiter::InMemoryRateLimitStore,
    repositories::mailer::EmailSender,
    use_cases::{contact::ContactHandler, rate_limit::RateLimiter},
};
use serde_json::{json, Value};

mock! {
    pub Mailer {}

    #[async_trait]
    impl EmailSender for Mailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<String, EmailError>;
    }
}

const FROM: &str = "Portfolio <contact@example.com>";
const TO: &str = "owner@example.com";

fn handler(mailer: Option<MockMailer>) -> ContactHandler<InMemoryRateLimitStore, MockMailer> {
    let limiter = RateLimiter::new(
        InMemoryRateLimitStore::new(),
        RateLimitPolicy::new(5, Duration::from_secs(3600)),
    );
    ContactHandler::new(limiter, mailer, FROM, TO)
}

fn body(value: Value) -> Vec<u8> {
    serde_json::to_vec(&value).unwrap()
}

fn valid_body() -> Vec<u8> {
    body(json!({
        "name": "Al",
        "email": "AL@Example.COM",
        "message": "Hello there, interested in connecting!"
    }))
}

/// Collects formatted `tracing` output for the current thread.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

async fn response_body(err: &AppError) -> String {
    let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[actix_rt::test]
async fn dispatches_email_addressed_to_operator_with_reply_to_submitter() {
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .withf(|email| {
            email.from == FROM
                && email.to == TO
                && email.reply_to == "al@example.com"
                && email.subject == "New contact form message from Al"
                && email.text.contains("Hello there, interested in connecting!")
        })
        .times(1)
        .returning(|_| Ok("msg_123".to_string()));

    let handler = handler(Some(mailer));

    let receipt = handler.submit("203.0.113.1", &valid_body()).await.unwrap();

    assert_eq!(receipt.message_id, "msg_123");
    assert_eq!(receipt.limit, 5);
    assert_eq!(receipt.remaining, 4);
}

#[actix_rt::test]
async fn validation_failure_skips_dispatch() {
    let mut mailer = MockMailer::new();
    mailer.expect_send().never();

    let handler = handler(Some(mailer));

    let err = handler
        .submit("203.0.113.2", &body(json!({ "name": "", "email": "x", "message": "" })))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    match err {
        AppError::ValidationError(errors) => assert_eq!(errors.len(), 3),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[actix_rt::test]
async fn sixth_request_is_rate_limited_before_parsing() {
    let mut mailer = MockMailer::new();
    mailer.expect_send().times(5).returning(|_| Ok("msg".to_string()));

    let handler = handler(Some(mailer));
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();

    for _ in 0..5 {
        handler.submit_at("198.51.100.9", &valid_body(), now).await.unwrap();
    }

    let err = handler
        .submit_at("198.51.100.9", b"not even json", now + TimeDelta::minutes(1))
        .await
        .unwrap_err();

    match err {
        AppError::RateLimitExceeded { limit, retry_after_secs } => {
            assert_eq!(limit, 5);
            assert_eq!(retry_after_secs, 59 * 60);
        }
        other => panic!("expected rate limit error, got {:?}", other),
    }
}

#[actix_rt::test]
async fn quota_returns_after_window_elapses() {
    let mut mailer = MockMailer::new();
    mailer.expect_send().times(6).returning(|_| Ok("msg".to_string()));

    let handler = handler(Some(mailer));
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();

    for _ in 0..5 {
        handler.submit_at("198.51.100.10", &valid_body(), now).await.unwrap();
    }

    let later = now + TimeDelta::hours(1) + TimeDelta::seconds(1);
    let receipt = handler.submit_at("198.51.100.10", &valid_body(), later).await.unwrap();

    assert_eq!(receipt.remaining, 4);
}

#[actix_rt::test]
async fn malformed_json_is_an_unexpected_error() {
    let mut mailer = MockMailer::new();
    mailer.expect_send().never();

    let handler = handler(Some(mailer));

    let err = handler.submit("203.0.113.3", b"{\"name\":").await.unwrap_err();

    assert!(matches!(err, AppError::InternalError(_)));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_rt::test]
async fn missing_mailer_is_service_unavailable() {
    let handler = handler(None);

    let err = handler.submit("203.0.113.4", &valid_body()).await.unwrap_err();

    assert!(matches!(err, AppError::ServiceUnavailable(_)));
    assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_rt::test]
async fn provider_error_fails_loudly_without_leaking_detail() {
    let mut mailer = MockMailer::new();
    mailer.expect_send().times(1).returning(|_| {
        Err(EmailError::Rejected {
            status: 422,
            body: "invalid from address: contact@example.com".to_string(),
        })
    });

    let handler = handler(Some(mailer));
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let err = handler.submit("203.0.113.5", &valid_body()).await.unwrap_err();

    assert!(matches!(err, AppError::DispatchFailure(_)));
    assert!(err.to_string().contains("invalid from address"));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let client_body = response_body(&err).await;
    assert!(client_body.contains("An error occurred. Please try again later."));
    assert!(!client_body.contains("invalid from address"));

    let logged = logs.contents();
    assert!(logged.contains("ERROR"));
    assert!(logged.contains("Failed to dispatch contact email"));
    assert!(logged.contains("status 422: invalid from address: contact@example.com"));
}

#[actix_rt::test]
async fn provider_timeout_is_a_dispatch_failure() {
    let mut mailer = MockMailer::new();
    mailer.expect_send().times(1).returning(|_| Err(EmailError::Timeout));

    let handler = handler(Some(mailer));

    let err = handler.submit("203.0.113.6", &valid_body()).await.unwrap_err();

    assert!(matches!(err, AppError::DispatchFailure(_)));
}

#[actix_rt::test]
async fn admitted_request_is_processed_with_its_quota() {
    let mut mailer = MockMailer::new();
    mailer.expect_send().times(1).returning(|_| Ok("msg_split".to_string()));

    let handler = handler(Some(mailer));

    let decision = handler.check_rate_limit("203.0.113.7").await.unwrap();
    let receipt = handler.process("203.0.113.7", &decision, &valid_body()).await.unwrap();

    assert_eq!(receipt.message_id, "msg_split");
    assert_eq!(receipt.remaining, 4);
}

#[actix_rt::test]
async fn quota_check_rejects_without_touching_the_body() {
    let handler = handler(None);
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();

    for _ in 0..5 {
        handler.check_rate_limit_at("203.0.113.8", now).await.unwrap();
    }

    let err = handler.check_rate_limit_at("203.0.113.8", now).await.unwrap_err();

    assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[actix_rt::test]
async fn rate_limit_response_carries_accounting_headers() {
    let err = AppError::RateLimitExceeded { limit: 5, retry_after_secs: 120 };

    let response = err.error_response();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "5");
    assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "0");
    assert_eq!(response.headers().get("retry-after").unwrap(), "120");
}

#[test]
fn html_body_escapes_submitted_markup() {
    let submission = ContactSubmission {
        name: "<script>alert(1)</script>".to_string(),
        email: "al@example.com".to_string(),
        message: "line one\n<b>line two</b>".to_string(),
    };

    let email = OutgoingEmail::from_submission(&submission, FROM, TO);

    assert!(!email.html.contains("<script>"));
    assert!(!email.html.contains("<b>"));
    assert!(email.html.contains("<br>"));
    assert!(email.text.contains("<b>line two</b>"));
    assert_eq!(email.subject, "New contact form message from <script>alert(1)</script>");
}
