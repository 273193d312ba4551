//! Payment Error Types

use std::collections::BTreeMap;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Chargily Pay API returned an error response
    #[error("Chargily API error: {0}")]
    Api(String),

    /// Transport-level failure talking to the API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Checkout carries no `payment_id` metadata
    #[error("Missing payment metadata")]
    MissingMetadata,

    /// No payment row with this id
    #[error("Payment not found: {0}")]
    PaymentNotFound(i64),

    /// Checkout form failed validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Field name → messages
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// First message overall, used as the summary line
    pub fn first(&self) -> Option<&str> {
        self.0.values().flatten().next().map(String::as_str)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl PaymentError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::Api(_) | PaymentError::Http(_) | PaymentError::Storage(_)
        )
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::Api(_) | PaymentError::Http(_) => {
                "Payment processing failed. Please try again."
            }
            PaymentError::MissingMetadata => "Missing payment metadata",
            PaymentError::PaymentNotFound(_) => "Payment not found.",
            PaymentError::Validation(_) => "The given data was invalid.",
            PaymentError::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your request.",
        }
    }
}

impl From<rusqlite::Error> for PaymentError {
    fn from(err: rusqlite::Error) -> Self {
        PaymentError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(PaymentError::Api("500".into()).is_retryable());
        assert!(PaymentError::Storage("locked".into()).is_retryable());
        assert!(!PaymentError::MissingMetadata.is_retryable());
        assert!(!PaymentError::validation("amount", "required").is_retryable());
    }

    #[test]
    fn test_validation_display() {
        let err = PaymentError::validation("currency", "The currency field is required.");
        assert_eq!(
            err.to_string(),
            "Validation failed: currency: The currency field is required."
        );
    }
}
