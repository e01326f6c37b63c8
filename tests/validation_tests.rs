use portfolio_contact::{
    entities::contact::ContactSubmission,
    errors::{AppError, FieldError},
};
use serde_json::{json, Value};

fn field_errors(body: Value) -> Vec<FieldError> {
    match ContactSubmission::parse(&body) {
        Err(AppError::ValidationError(errors)) => errors,
        other => panic!("expected validation error, got {:?}", other),
    }
}

fn submission(name: &str, email: &str, message: &str) -> Value {
    json!({ "name": name, "email": email, "message": message })
}

#[test]
fn valid_input_is_trimmed_and_email_lowercased() {
    let parsed = ContactSubmission::parse(&submission(
        "  Al  ",
        "  AL@Example.COM ",
        "\n Hello there, interested in connecting! \t",
    ))
    .unwrap();

    assert_eq!(parsed, ContactSubmission {
        name: "Al".into(),
        email: "al@example.com".into(),
        message: "Hello there, interested in connecting!".into(),
    });
}

#[test]
fn parsing_a_normalized_submission_again_is_idempotent() {
    let first = ContactSubmission::parse(&submission(
        " Grace Hopper ",
        "Grace@Navy.MIL",
        "  Compilers are just programs that write programs. ",
    ))
    .unwrap();

    let second = ContactSubmission::parse(&serde_json::to_value(&first).unwrap()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn message_length_boundaries() {
    let nine = "a".repeat(9);
    let ten = "a".repeat(10);
    let thousand = "a".repeat(1000);
    let too_long = "a".repeat(1001);

    assert_eq!(
        field_errors(submission("Al", "al@example.com", &nine)),
        vec![FieldError::new("message", "Message must be at least 10 characters")]
    );
    assert!(ContactSubmission::parse(&submission("Al", "al@example.com", &ten)).is_ok());
    assert!(ContactSubmission::parse(&submission("Al", "al@example.com", &thousand)).is_ok());
    assert_eq!(
        field_errors(submission("Al", "al@example.com", &too_long)),
        vec![FieldError::new("message", "Message is too long")]
    );
}

#[test]
fn message_is_trimmed_before_length_check() {
    let padded_nine = format!("   {}   ", "a".repeat(9));

    let errors = field_errors(submission("Al", "al@example.com", &padded_nine));

    assert_eq!(errors[0].field, "message");
}

#[test]
fn name_length_boundaries() {
    let message = "Hello there, interested in connecting!";

    assert!(ContactSubmission::parse(&submission(&"n".repeat(100), "al@example.com", message)).is_ok());
    assert_eq!(
        field_errors(submission(&"n".repeat(101), "al@example.com", message)),
        vec![FieldError::new("name", "Name is too long")]
    );
    assert_eq!(
        field_errors(submission("   ", "al@example.com", message)),
        vec![FieldError::new("name", "Name is required")]
    );
}

#[test]
fn lengths_are_counted_in_characters() {
    let name = "é".repeat(100);

    let parsed = ContactSubmission::parse(&submission(&name, "al@example.com", "ünïcödé çhärs")).unwrap();

    assert_eq!(parsed.name.chars().count(), 100);
}

#[test]
fn invalid_emails_are_rejected() {
    for email in ["", "plainaddress", "@example.com", "al@", "al example@example.com"] {
        assert_eq!(
            field_errors(submission("Al", email, "Hello there, interested in connecting!")),
            vec![FieldError::new("email", "Please enter a valid email")],
            "email {:?} should be rejected",
            email
        );
    }
}

#[test]
fn every_invalid_field_is_reported_in_form_order() {
    let errors = field_errors(submission("", "nope", "short"));

    assert_eq!(errors, vec![
        FieldError::new("name", "Name is required"),
        FieldError::new("email", "Please enter a valid email"),
        FieldError::new("message", "Message must be at least 10 characters"),
    ]);
}

#[test]
fn wrongly_typed_fields_are_reported_once() {
    let errors = field_errors(json!({
        "name": 42,
        "email": "al@example.com",
        "message": ["not", "a", "string"]
    }));

    assert_eq!(errors, vec![
        FieldError::new("name", "Expected a string"),
        FieldError::new("message", "Expected a string"),
    ]);
}

#[test]
fn null_fields_count_as_missing() {
    let errors = field_errors(json!({
        "name": null,
        "email": "al@example.com",
        "message": "Hello there, interested in connecting!"
    }));

    assert_eq!(errors, vec![FieldError::new("name", "Name is required")]);
}

#[test]
fn non_object_body_is_rejected() {
    let errors = field_errors(json!(["Al", "al@example.com", "Hello there"]));

    assert_eq!(errors, vec![FieldError::new("body", "Expected a JSON object")]);
}
