use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::{
    constants::{MESSAGE_MAX, MESSAGE_MIN, NAME_MAX, NAME_MIN},
    errors::{field_errors, AppError, FieldError},
};

const FIELD_ORDER: [&str; 3] = ["name", "email", "message"];

/// Raw form fields after trimming and email lower-casing, not yet validated.
#[derive(Debug, Clone, Default, Validate)]
pub struct ContactForm {
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,

    #[validate(custom(function = "validate_message"))]
    pub message: String,
}

/// A contact form submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub message: String,
}

impl ContactForm {
    /// Pulls the three fields out of an untyped JSON body.
    ///
    /// Missing or `null` fields become empty strings so they fail the length
    /// rules. Fields of the wrong JSON type are reported immediately.
    pub fn from_json(body: &Value) -> Result<(Self, Vec<FieldError>), AppError> {
        let Some(fields) = body.as_object() else {
            return Err(AppError::ValidationError(vec![
                FieldError::new("body", "Expected a JSON object"),
            ]));
        };

        let mut type_errors = Vec::new();
        let mut take = |field: &str| match fields.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(value)) => value.clone(),
            Some(_) => {
                type_errors.push(FieldError::new(field, "Expected a string"));
                String::new()
            }
        };

        let form = ContactForm {
            name: take("name"),
            email: take("email"),
            message: take("message"),
        };

        Ok((form, type_errors))
    }

    pub fn normalized(self) -> Self {
        ContactForm {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            message: self.message.trim().to_string(),
        }
    }
}

impl ContactSubmission {
    /// Parses an untyped JSON body, reporting every invalid field at once.
    pub fn parse(body: &Value) -> Result<Self, AppError> {
        let (form, mut errors) = ContactForm::from_json(body)?;
        let form = form.normalized();

        if let Err(validation) = form.validate() {
            let rule_errors: Vec<FieldError> = field_errors(&validation)
                .into_iter()
                .filter(|e| !errors.iter().any(|t| t.field == e.field))
                .collect();
            errors.extend(rule_errors);
        }

        if !errors.is_empty() {
            errors.sort_by_key(|e| field_position(&e.field));
            return Err(AppError::ValidationError(errors));
        }

        Ok(ContactSubmission {
            name: form.name,
            email: form.email,
            message: form.message,
        })
    }
}

fn field_position(field: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|f| *f == field)
        .unwrap_or(FIELD_ORDER.len())
}

fn length_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len < NAME_MIN {
        return Err(length_error("name_required", "Name is required"));
    }
    if len > NAME_MAX {
        return Err(length_error("name_length", "Name is too long"));
    }
    Ok(())
}

pub fn validate_message(message: &str) -> Result<(), ValidationError> {
    let len = message.chars().count();
    if len < MESSAGE_MIN {
        return Err(length_error("message_length", "Message must be at least 10 characters"));
    }
    if len > MESSAGE_MAX {
        return Err(length_error("message_length", "Message is too long"));
    }
    Ok(())
}
