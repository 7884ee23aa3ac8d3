//! Checkout Orchestration
//!
//! Ties a tier selection to an externally hosted payment session and back
//! to fulfillment state. Payment-provider outages degrade to demo mode so
//! the rest of the flow stays usable; that is a product decision, and the
//! demo flag is always explicit on the result.

use std::sync::Arc;

use serde::Serialize;

use crate::catalog::{Catalog, TierId};
use crate::error::{PaymentError, Result};
use crate::gateway::{PaymentGateway, RedirectUrls};
use crate::order::{Order, OrderId, OrderStore};

/// Result of starting a checkout
#[derive(Clone, Debug, Serialize)]
pub struct CheckoutHandle {
    /// The order created for this checkout
    pub order_id: OrderId,

    /// Payment-session reference (fabricated `demo_` ref in demo mode)
    pub session_id: String,

    /// Hosted checkout page to redirect the user to; absent in demo mode
    pub checkout_url: Option<String>,

    /// Whether this checkout runs without a real payment provider
    pub demo: bool,

    /// Computed total in minor currency units
    pub total_cents: i64,
}

/// Checkout orchestrator
///
/// Composes the catalog, the order store, and the payment gateway. The
/// gateway is optional; without one every checkout is a demo checkout.
pub struct CheckoutService<S: OrderStore> {
    catalog: Arc<Catalog>,
    orders: Arc<S>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    urls: RedirectUrls,
}

impl<S: OrderStore> CheckoutService<S> {
    pub fn new(
        catalog: Arc<Catalog>,
        orders: Arc<S>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        urls: RedirectUrls,
    ) -> Self {
        Self {
            catalog,
            orders,
            gateway,
            urls,
        }
    }

    /// Whether a real payment gateway is configured
    pub fn live(&self) -> bool {
        self.gateway.is_some()
    }

    /// Start a checkout for a topic and tier
    ///
    /// Creates a pending order, requests a payment session, and returns the
    /// redirect handle. Provider failure falls back to a demo handle rather
    /// than surfacing an error to the buyer.
    pub async fn start_checkout(
        &self,
        topic: &str,
        tier: TierId,
        upsells: Vec<String>,
        email: Option<String>,
    ) -> Result<CheckoutHandle> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(PaymentError::InvalidInput("topic is required".into()));
        }

        let total = self.catalog.price(tier, &upsells)?;
        let order = Order::new(topic, tier, upsells, email, total);
        self.orders.insert(&order)?;

        match &self.gateway {
            Some(gateway) => {
                match gateway
                    .create_session(&order, &self.catalog, &self.urls)
                    .await
                {
                    Ok(session) => {
                        self.orders.attach_session(&order.id, &session.id, false)?;
                        tracing::info!(
                            order_id = %order.id,
                            session_id = %session.id,
                            tier = %tier,
                            total_cents = total,
                            "created payment session"
                        );
                        Ok(CheckoutHandle {
                            order_id: order.id,
                            session_id: session.id,
                            checkout_url: Some(session.url),
                            demo: false,
                            total_cents: total,
                        })
                    }
                    Err(e) => {
                        tracing::warn!(
                            order_id = %order.id,
                            error = %e,
                            "payment provider unavailable, falling back to demo checkout"
                        );
                        self.demo_handle(order)
                    }
                }
            }
            None => self.demo_handle(order),
        }
    }

    /// Fabricate a local session so the flow stays testable without live
    /// payments
    fn demo_handle(&self, order: Order) -> Result<CheckoutHandle> {
        let session_ref = format!("demo_{}", uuid::Uuid::new_v4().simple());
        self.orders.attach_session(&order.id, &session_ref, true)?;

        tracing::info!(
            order_id = %order.id,
            session_id = %session_ref,
            "created demo checkout session"
        );

        Ok(CheckoutHandle {
            order_id: order.id,
            session_id: session_ref,
            checkout_url: None,
            demo: true,
            total_cents: order.total_cents,
        })
    }

    /// Look up the order behind a session reference, for status polling
    pub fn session_status(&self, session_ref: &str) -> Result<Option<Order>> {
        self.orders.get_by_session(session_ref)
    }

    /// Look up an order by id
    pub fn order(&self, id: &OrderId) -> Result<Option<Order>> {
        self.orders.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewaySession;
    use crate::order::{MemoryOrderStore, OrderStatus};
    use async_trait::async_trait;

    struct OkGateway;

    #[async_trait]
    impl PaymentGateway for OkGateway {
        async fn create_session(
            &self,
            order: &Order,
            _catalog: &Catalog,
            _urls: &RedirectUrls,
        ) -> Result<GatewaySession> {
            Ok(GatewaySession {
                id: format!("cs_test_{}", order.id),
                url: "https://checkout.stripe.com/pay/cs_test".into(),
            })
        }
    }

    struct DownGateway;

    #[async_trait]
    impl PaymentGateway for DownGateway {
        async fn create_session(
            &self,
            _order: &Order,
            _catalog: &Catalog,
            _urls: &RedirectUrls,
        ) -> Result<GatewaySession> {
            Err(PaymentError::Stripe("connection reset".into()))
        }
    }

    fn service(
        gateway: Option<Arc<dyn PaymentGateway>>,
    ) -> CheckoutService<MemoryOrderStore> {
        CheckoutService::new(
            Arc::new(Catalog::standard()),
            Arc::new(MemoryOrderStore::new()),
            gateway,
            RedirectUrls::for_domain("test.wizbook.io"),
        )
    }

    #[tokio::test]
    async fn test_live_checkout_returns_redirect() {
        let service = service(Some(Arc::new(OkGateway)));
        let handle = service
            .start_checkout("Python Programming", TierId::Pro, vec![], None)
            .await
            .unwrap();

        assert!(!handle.demo);
        assert!(handle.checkout_url.is_some());
        assert_eq!(handle.total_cents, 9700);

        let order = service.session_status(&handle.session_id).unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::AwaitingPayment);
    }

    #[tokio::test]
    async fn test_unconfigured_gateway_yields_demo_mode() {
        let service = service(None);
        let handle = service
            .start_checkout("Python Programming", TierId::Basic, vec![], None)
            .await
            .unwrap();

        assert!(handle.demo);
        assert!(handle.checkout_url.is_none());
        assert!(handle.session_id.starts_with("demo_"));

        let order = service.session_status(&handle.session_id).unwrap().unwrap();
        assert!(order.demo);
        assert_eq!(order.status, OrderStatus::AwaitingPayment);
    }

    #[tokio::test]
    async fn test_gateway_outage_degrades_to_demo_mode() {
        let service = service(Some(Arc::new(DownGateway)));
        let handle = service
            .start_checkout("Python Programming", TierId::Pro, vec![], None)
            .await
            .unwrap();

        assert!(handle.demo);
        assert!(handle.session_id.starts_with("demo_"));
    }

    #[tokio::test]
    async fn test_upsell_total_flows_into_handle() {
        let service = service(None);
        let handle = service
            .start_checkout(
                "Python Programming",
                TierId::Pro,
                vec!["audiobook".into()],
                None,
            )
            .await
            .unwrap();

        assert_eq!(handle.total_cents, 9700 + 2900);
    }

    #[tokio::test]
    async fn test_empty_topic_rejected() {
        let service = service(None);
        let result = service
            .start_checkout("  ", TierId::Pro, vec![], None)
            .await;
        assert!(matches!(result, Err(PaymentError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_invalid_upsell_rejected_before_any_session() {
        let service = service(None);
        let result = service
            .start_checkout(
                "Python Programming",
                TierId::Business,
                vec!["commercial-license".into()],
                None,
            )
            .await;
        assert!(matches!(result, Err(PaymentError::InvalidUpsell(_))));
    }
}
