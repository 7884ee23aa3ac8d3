//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Request validation failed (empty topic, malformed fields)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Tier id does not resolve in the catalog
    #[error("Unknown pricing tier: {0}")]
    InvalidTier(String),

    /// Upsell id is unknown, duplicated, or incompatible with the tier
    #[error("Invalid upsell: {0}")]
    InvalidUpsell(String),

    /// Email address failed validation
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    InvalidSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Webhook references a payment session we do not hold
    #[error("Unknown payment session: {0}")]
    UnknownSession(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentError::Stripe(_) | PaymentError::Storage(_))
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::InvalidInput(_) => "Please check your request and try again.",
            PaymentError::InvalidTier(_) => "That pricing tier does not exist.",
            PaymentError::InvalidUpsell(_) => "One of the selected add-ons is not available.",
            PaymentError::InvalidEmail(_) => "Please enter a valid email address.",
            PaymentError::Stripe(_) => "Payment processing failed. Please try again.",
            PaymentError::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your request.",
        }
    }
}
