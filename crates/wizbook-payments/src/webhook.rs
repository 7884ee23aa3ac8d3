//! Stripe Webhook Reconciliation
//!
//! Verifies webhook signatures and reconciles payment outcomes against the
//! order store. Signature failures are fatal to the request and never touch
//! state; unknown sessions are acknowledged and logged so provider retries
//! keep working.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{PaymentError, Result};
use crate::order::{Order, OrderStore, Transition};

type HmacSha256 = Hmac<Sha256>;

/// Replay tolerance for webhook timestamps
const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Outcome of processing a webhook delivery
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ack {
    /// An order moved to `paid` and fulfillment ran
    Fulfilled,
    /// An order moved to a failure state
    MarkedFailed,
    /// Replay of an already-settled session; nothing changed
    Replayed,
    /// The session is not ours; acknowledged so the provider stops retrying
    UnknownSession,
    /// Event type we do not act on
    Ignored,
}

/// Hook invoked exactly once when an order is confirmed paid
///
/// Implementations deliver the purchased content (email the download link,
/// queue the export). The default implementation records the obligation in
/// the log.
#[async_trait]
pub trait Fulfillment: Send + Sync {
    async fn deliver(&self, order: &Order) -> Result<()>;
}

/// Log-only fulfillment
pub struct LogFulfillment;

#[async_trait]
impl Fulfillment for LogFulfillment {
    async fn deliver(&self, order: &Order) -> Result<()> {
        tracing::info!(
            order_id = %order.id,
            topic = %order.topic,
            tier = %order.tier,
            email = ?order.email,
            "order paid, ready for delivery"
        );
        Ok(())
    }
}

/// Minimal shape of the provider event payload
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    kind: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    object: WebhookObject,
}

#[derive(Debug, Deserialize)]
struct WebhookObject {
    id: String,
}

/// Webhook reconciler
pub struct Reconciler<S: OrderStore> {
    orders: Arc<S>,
    fulfillment: Arc<dyn Fulfillment>,
    signing_secret: String,
    tolerance_secs: i64,
}

impl<S: OrderStore> Reconciler<S> {
    pub fn new(
        orders: Arc<S>,
        fulfillment: Arc<dyn Fulfillment>,
        signing_secret: impl Into<String>,
    ) -> Self {
        Self {
            orders,
            fulfillment,
            signing_secret: signing_secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Override the replay tolerance (tests)
    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verify and reconcile a webhook delivery
    ///
    /// Fails closed on signature mismatch before any payload inspection.
    /// Replayed deliveries are idempotent: a second `completed` event for a
    /// session never double-fulfills.
    pub async fn reconcile(&self, payload: &str, signature_header: &str) -> Result<Ack> {
        verify_signature(
            payload,
            signature_header,
            &self.signing_secret,
            self.tolerance_secs,
            Utc::now().timestamp(),
        )?;

        let event: WebhookEvent = serde_json::from_str(payload)
            .map_err(|e| PaymentError::WebhookParse(e.to_string()))?;
        let session_ref = &event.data.object.id;

        tracing::info!(event_type = %event.kind, session_id = %session_ref, "processing webhook");

        let outcome = match event.kind.as_str() {
            "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
                match self.orders.mark_paid(session_ref) {
                    Ok(Transition::Applied) => {
                        if let Some(order) = self.orders.get_by_session(session_ref)? {
                            self.fulfillment.deliver(&order).await?;
                        }
                        Ack::Fulfilled
                    }
                    Ok(Transition::AlreadySettled) => Ack::Replayed,
                    Err(PaymentError::UnknownSession(_)) => Ack::UnknownSession,
                    Err(e) => return Err(e),
                }
            }
            "checkout.session.async_payment_failed" => {
                self.mark_failed(session_ref, false)?
            }
            "checkout.session.expired" => self.mark_failed(session_ref, true)?,
            _ => Ack::Ignored,
        };

        if outcome == Ack::UnknownSession {
            tracing::warn!(session_id = %session_ref, "webhook for unknown session, acknowledging");
        }

        Ok(outcome)
    }

    fn mark_failed(&self, session_ref: &str, cancelled: bool) -> Result<Ack> {
        match self.orders.mark_failed(session_ref, cancelled) {
            Ok(Transition::Applied) => Ok(Ack::MarkedFailed),
            Ok(Transition::AlreadySettled) => Ok(Ack::Replayed),
            Err(PaymentError::UnknownSession(_)) => Ok(Ack::UnknownSession),
            Err(e) => Err(e),
        }
    }
}

/// Verify a Stripe-style signature header against a payload
///
/// The header carries a timestamp and one or more `v1` signatures:
/// `t=<unix>,v1=<hex hmac of "t.payload">`. The comparison is constant-time
/// and deliveries outside the tolerance window are rejected.
pub fn verify_signature(
    payload: &str,
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<()> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse().ok();
            }
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| PaymentError::InvalidSignature("missing timestamp".into()))?;
    if candidates.is_empty() {
        return Err(PaymentError::InvalidSignature("missing v1 signature".into()));
    }
    if (now - timestamp).abs() > tolerance_secs {
        return Err(PaymentError::InvalidSignature("timestamp outside tolerance".into()));
    }

    let signed_payload = format!("{timestamp}.{payload}");
    for candidate in candidates {
        let Ok(expected) = hex::decode(candidate) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| PaymentError::InvalidSignature(e.to_string()))?;
        mac.update(signed_payload.as_bytes());
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err(PaymentError::InvalidSignature("no matching signature".into()))
}

/// Produce a signature header for a payload
///
/// Counterpart of `verify_signature`, used to construct deliveries in tests
/// and local tooling.
pub fn sign_payload(payload: &str, secret: &str, timestamp: i64) -> String {
    let signed_payload = format!("{timestamp}.{payload}");
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(signed_payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TierId;
    use crate::order::{MemoryOrderStore, OrderStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SECRET: &str = "whsec_test_secret";

    struct CountingFulfillment {
        deliveries: AtomicUsize,
    }

    #[async_trait]
    impl Fulfillment for CountingFulfillment {
        async fn deliver(&self, _order: &Order) -> Result<()> {
            self.deliveries.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn completed_payload(session_ref: &str) -> String {
        serde_json::json!({
            "type": "checkout.session.completed",
            "data": { "object": { "id": session_ref } }
        })
        .to_string()
    }

    fn store_with_session(session_ref: &str) -> Arc<MemoryOrderStore> {
        let store = Arc::new(MemoryOrderStore::new());
        let order = Order::new("Python Programming", TierId::Pro, vec![], None, 9700);
        store.insert(&order).unwrap();
        store.attach_session(&order.id, session_ref, false).unwrap();
        store
    }

    #[test]
    fn test_signature_roundtrip() {
        let header = sign_payload("{}", SECRET, 1_700_000_000);
        assert!(verify_signature("{}", &header, SECRET, 300, 1_700_000_010).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let header = sign_payload("{}", SECRET, 1_700_000_000);
        let result = verify_signature("{\"a\":1}", &header, SECRET, 300, 1_700_000_010);
        assert!(matches!(result, Err(PaymentError::InvalidSignature(_))));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let header = sign_payload("{}", "whsec_other", 1_700_000_000);
        let result = verify_signature("{}", &header, SECRET, 300, 1_700_000_010);
        assert!(matches!(result, Err(PaymentError::InvalidSignature(_))));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let header = sign_payload("{}", SECRET, 1_700_000_000);
        let result = verify_signature("{}", &header, SECRET, 300, 1_700_009_999);
        assert!(matches!(result, Err(PaymentError::InvalidSignature(_))));
    }

    #[tokio::test]
    async fn test_completed_event_marks_paid_and_fulfills_once() {
        let store = store_with_session("cs_test_abc");
        let fulfillment = Arc::new(CountingFulfillment {
            deliveries: AtomicUsize::new(0),
        });
        let reconciler = Reconciler::new(store.clone(), fulfillment.clone(), SECRET);

        let payload = completed_payload("cs_test_abc");
        let header = sign_payload(&payload, SECRET, Utc::now().timestamp());

        let ack = reconciler.reconcile(&payload, &header).await.unwrap();
        assert_eq!(ack, Ack::Fulfilled);
        assert_eq!(fulfillment.deliveries.load(Ordering::SeqCst), 1);

        let order = store.get_by_session("cs_test_abc").unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);

        // Replay: status unchanged, no second delivery
        let ack = reconciler.reconcile(&payload, &header).await.unwrap();
        assert_eq!(ack, Ack::Replayed);
        assert_eq!(fulfillment.deliveries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_signature_never_mutates_state() {
        let store = store_with_session("cs_test_abc");
        let reconciler = Reconciler::new(store.clone(), Arc::new(LogFulfillment), SECRET);

        let payload = completed_payload("cs_test_abc");
        let header = sign_payload(&payload, "whsec_wrong", Utc::now().timestamp());

        let result = reconciler.reconcile(&payload, &header).await;
        assert!(matches!(result, Err(PaymentError::InvalidSignature(_))));

        let order = store.get_by_session("cs_test_abc").unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::AwaitingPayment);
    }

    #[tokio::test]
    async fn test_unknown_session_is_acknowledged() {
        let store = Arc::new(MemoryOrderStore::new());
        let reconciler = Reconciler::new(store, Arc::new(LogFulfillment), SECRET);

        let payload = completed_payload("cs_unseen");
        let header = sign_payload(&payload, SECRET, Utc::now().timestamp());

        let ack = reconciler.reconcile(&payload, &header).await.unwrap();
        assert_eq!(ack, Ack::UnknownSession);
    }

    #[tokio::test]
    async fn test_expired_session_is_cancelled() {
        let store = store_with_session("cs_test_abc");
        let reconciler = Reconciler::new(store.clone(), Arc::new(LogFulfillment), SECRET);

        let payload = serde_json::json!({
            "type": "checkout.session.expired",
            "data": { "object": { "id": "cs_test_abc" } }
        })
        .to_string();
        let header = sign_payload(&payload, SECRET, Utc::now().timestamp());

        let ack = reconciler.reconcile(&payload, &header).await.unwrap();
        assert_eq!(ack, Ack::MarkedFailed);

        let order = store.get_by_session("cs_test_abc").unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_unhandled_event_is_ignored() {
        let store = store_with_session("cs_test_abc");
        let reconciler = Reconciler::new(store.clone(), Arc::new(LogFulfillment), SECRET);

        let payload = serde_json::json!({
            "type": "invoice.created",
            "data": { "object": { "id": "in_123" } }
        })
        .to_string();
        let header = sign_payload(&payload, SECRET, Utc::now().timestamp());

        let ack = reconciler.reconcile(&payload, &header).await.unwrap();
        assert_eq!(ack, Ack::Ignored);

        let order = store.get_by_session("cs_test_abc").unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::AwaitingPayment);
    }
}
