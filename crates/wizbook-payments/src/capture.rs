//! Email Capture
//!
//! Append-only store of marketing email captures, validated and normalized
//! at the door. Malformed addresses are a client error, never a crash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use validator::ValidateEmail;

use crate::catalog::TierId;
use crate::error::{PaymentError, Result};

/// One captured email address
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmailCapture {
    /// Normalized (lowercased, trimmed) address
    pub email: String,

    /// Tier the visitor showed interest in, if any
    pub tier_interest: Option<TierId>,

    /// Topic they were generating, if any
    pub topic: Option<String>,

    /// Capture timestamp
    pub captured_at: DateTime<Utc>,
}

impl EmailCapture {
    /// Validate and normalize a raw address into a capture record
    pub fn new(
        raw_email: &str,
        tier_interest: Option<TierId>,
        topic: Option<String>,
    ) -> Result<Self> {
        let email = normalize_email(raw_email)?;
        Ok(Self {
            email,
            tier_interest,
            topic,
            captured_at: Utc::now(),
        })
    }
}

/// Validate an email address and normalize it to lowercase
pub fn normalize_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    if !email.validate_email() {
        return Err(PaymentError::InvalidEmail(email));
    }
    Ok(email)
}

/// Append-only capture storage
pub trait CaptureStore: Send + Sync {
    /// Record a capture
    fn append(&self, capture: EmailCapture) -> Result<()>;

    /// Number of captures held
    fn count(&self) -> usize;
}

/// In-memory capture store
pub struct MemoryCaptureStore {
    entries: RwLock<Vec<EmailCapture>>,
}

impl Default for MemoryCaptureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCaptureStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of all captures
    pub fn all(&self) -> Vec<EmailCapture> {
        self.entries.read().unwrap().clone()
    }
}

impl CaptureStore for MemoryCaptureStore {
    fn append(&self, capture: EmailCapture) -> Result<()> {
        self.entries.write().unwrap().push(capture);
        Ok(())
    }

    fn count(&self) -> usize {
        self.entries.read().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email_normalized() {
        let capture = EmailCapture::new("  Reader@Example.COM ", None, None).unwrap();
        assert_eq!(capture.email, "reader@example.com");
    }

    #[test]
    fn test_malformed_emails_rejected() {
        for bad in ["@missing-local.com", "no-at-sign", "trailing@", ""] {
            assert!(
                matches!(
                    normalize_email(bad),
                    Err(PaymentError::InvalidEmail(_))
                ),
                "expected rejection for {bad:?}"
            );
        }
    }

    #[test]
    fn test_capture_is_append_only() {
        let store = MemoryCaptureStore::new();
        store
            .append(EmailCapture::new("a@example.com", Some(TierId::Pro), None).unwrap())
            .unwrap();
        store
            .append(EmailCapture::new("b@example.com", None, Some("Chess".into())).unwrap())
            .unwrap();

        assert_eq!(store.count(), 2);
        let all = store.all();
        assert_eq!(all[0].email, "a@example.com");
        assert_eq!(all[1].topic.as_deref(), Some("Chess"));
    }
}
