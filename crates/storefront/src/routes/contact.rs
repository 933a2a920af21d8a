//! Contact form endpoint.
//!
//! Messages are validated and logged. They are not stored or emailed.

use axum::Json;
use luma_core::Email;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::FieldErrors;

/// Longest message accepted.
const MAX_MESSAGE_LEN: usize = 5000;

/// Contact form data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    /// Check required fields and email shape.
    ///
    /// # Errors
    ///
    /// Returns every failing field with a message.
    pub fn validate(&self) -> std::result::Result<Email, FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.name.trim().is_empty() {
            errors.insert("name", "Please enter your name.".to_string());
        }

        let email = Email::parse(&self.email).ok();
        if email.is_none() {
            errors.insert("email", "Please enter a valid email address.".to_string());
        }

        let message = self.message.trim();
        if message.is_empty() {
            errors.insert("message", "Please enter a message.".to_string());
        } else if message.chars().count() > MAX_MESSAGE_LEN {
            errors.insert(
                "message",
                format!("Messages are limited to {MAX_MESSAGE_LEN} characters."),
            );
        }

        match email {
            Some(email) if errors.is_empty() => Ok(email),
            _ => Err(errors),
        }
    }
}

/// Response for form submission.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/contact
#[instrument(skip_all)]
pub async fn submit(Json(form): Json<ContactForm>) -> Result<Json<ContactResponse>> {
    let email = form.validate().map_err(AppError::Validation)?;

    tracing::info!(
        email_domain = email.domain(),
        name = form.name.trim(),
        length = form.message.trim().chars().count(),
        "Contact message received"
    );

    Ok(Json(ContactResponse {
        success: true,
        message: "Thanks for reaching out. We'll be in touch soon.".to_string(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, message: &str) -> ContactForm {
        ContactForm {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let email = form("Thandi", " thandi@example.co.za ", "Do you ship to Durban?")
            .validate()
            .unwrap();
        assert_eq!(email.as_str(), "thandi@example.co.za");
    }

    #[test]
    fn test_reports_every_field() {
        let errors = form(" ", "nope", "").validate().unwrap_err();
        assert_eq!(
            errors.keys().copied().collect::<Vec<_>>(),
            vec!["email", "message", "name"]
        );
    }

    #[test]
    fn test_message_length_limit() {
        let long = "x".repeat(MAX_MESSAGE_LEN + 1);
        let errors = form("Sipho", "sipho@example.com", &long)
            .validate()
            .unwrap_err();
        assert!(errors.contains_key("message"));
    }
}
