use serde::Serialize;

use crate::entities::contact::ContactSubmission;

/// A message ready to hand to the email provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl OutgoingEmail {
    /// Builds the operator notification for a contact submission.
    /// Replies go straight to the submitter.
    pub fn from_submission(submission: &ContactSubmission, from: &str, to: &str) -> Self {
        let subject = format!("New contact form message from {}", submission.name);

        let text = format!(
            "Name: {}\nEmail: {}\n\nMessage:\n{}\n",
            submission.name, submission.email, submission.message
        );

        let html = format!(
            "<h2>New contact form message</h2>\
             <p><strong>Name:</strong> {}</p>\
             <p><strong>Email:</strong> {}</p>\
             <p><strong>Message:</strong></p>\
             <p>{}</p>",
            escape_html(&submission.name),
            escape_html(&submission.email),
            escape_multiline(&submission.message),
        );

        OutgoingEmail {
            from: from.to_string(),
            to: to.to_string(),
            reply_to: submission.email.clone(),
            subject,
            text,
            html,
        }
    }
}

fn escape_html(value: &str) -> String {
    ammonia::clean_text(value)
}

fn escape_multiline(value: &str) -> String {
    value
        .lines()
        .map(escape_html)
        .collect::<Vec<_>>()
        .join("<br>")
}
