//! Error Types

use thiserror::Error;

/// Result type alias for content generation
pub type Result<T> = std::result::Result<T, ContentError>;

/// Content generation errors
#[derive(Error, Debug)]
pub enum ContentError {
    /// Request validation failed (empty topic, malformed fields)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// LLM provider returned an error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unreachable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider attempt exceeded the configured timeout
    #[error("Provider timed out after {0}s")]
    Timeout(u64),

    /// Upstream quota exhausted
    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ContentError {
    /// Check if a retry against the same provider could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ContentError::ProviderUnavailable(_)
                | ContentError::Timeout(_)
                | ContentError::RateLimited(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            ContentError::InvalidInput(msg) => format!("Invalid request: {}", msg),
            ContentError::Provider(_) | ContentError::ProviderUnavailable(_) => {
                "The writing service is currently unavailable. Please try again.".into()
            }
            ContentError::Timeout(_) => "Generation took too long. Please try again.".into(),
            ContentError::RateLimited(_) => {
                "You've made too many requests. Please wait a moment.".into()
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for ContentError {
    fn from(err: anyhow::Error) -> Self {
        ContentError::Provider(err.to_string())
    }
}
