//! Payment Gateway Integration
//!
//! Implements the "Stripe Checkout (Hosted)" approach behind a gateway
//! trait so the orchestrator can be exercised without live payments.

use std::collections::HashMap;

use async_trait::async_trait;
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client,
    CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData, Currency,
};

use crate::catalog::Catalog;
use crate::error::{PaymentError, Result};
use crate::order::Order;

/// Redirect targets for the hosted checkout page
#[derive(Clone, Debug)]
pub struct RedirectUrls {
    /// Where the provider sends the user after a successful payment
    pub success: String,

    /// Where the provider sends the user if checkout is abandoned
    pub cancel: String,
}

impl RedirectUrls {
    /// Build the standard redirect pair for a deployment domain
    ///
    /// The success URL carries the provider's session-id placeholder so the
    /// landing page can poll `/api/session`.
    pub fn for_domain(domain: &str) -> Self {
        Self {
            success: format!("https://{domain}/success?session_id={{CHECKOUT_SESSION_ID}}"),
            cancel: format!("https://{domain}/cancel"),
        }
    }
}

/// A session created with the external payment provider
#[derive(Clone, Debug)]
pub struct GatewaySession {
    /// Provider session id
    pub id: String,

    /// Hosted checkout page to redirect the user to
    pub url: String,
}

/// Strategy trait for payment providers
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted payment session for an order
    async fn create_session(
        &self,
        order: &Order,
        catalog: &Catalog,
        urls: &RedirectUrls,
    ) -> Result<GatewaySession>;
}

/// Stripe gateway
pub struct StripeGateway {
    client: Client,
}

impl StripeGateway {
    /// Create a new Stripe gateway
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;
        Ok(Self::new(&secret_key))
    }

    fn line_item(name: String, amount_cents: i64) -> CreateCheckoutSessionLineItems {
        CreateCheckoutSessionLineItems {
            quantity: Some(1),
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency: Currency::USD,
                unit_amount: Some(amount_cents),
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name,
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    /// Create a Stripe Checkout session in one-time `payment` mode
    ///
    /// One line item per tier, one per selected upsell; the order id is
    /// carried in metadata so the webhook can correlate later.
    async fn create_session(
        &self,
        order: &Order,
        catalog: &Catalog,
        urls: &RedirectUrls,
    ) -> Result<GatewaySession> {
        let mut params = CreateCheckoutSession::new();
        params.success_url = Some(&urls.success);
        params.cancel_url = Some(&urls.cancel);
        params.mode = Some(CheckoutSessionMode::Payment);
        params.customer_email = order.email.as_deref();

        let mut metadata = HashMap::new();
        metadata.insert("order_id".to_string(), order.id.to_string());
        metadata.insert("topic".to_string(), order.topic.clone());
        metadata.insert("tier".to_string(), order.tier.to_string());
        params.metadata = Some(metadata);

        let tier = catalog.tier(order.tier);
        let mut line_items = vec![Self::line_item(
            format!("{}: {}", tier.name, order.topic),
            tier.price_cents,
        )];
        for id in &order.upsells {
            let upsell = catalog
                .upsell(id)
                .ok_or_else(|| PaymentError::InvalidUpsell(format!("unknown: {id}")))?;
            line_items.push(Self::line_item(upsell.name.clone(), upsell.price_cents));
        }
        params.line_items = Some(line_items);

        let session = StripeCheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::Stripe("No checkout URL returned".into()))?;

        Ok(GatewaySession {
            id: session.id.to_string(),
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_urls_for_domain() {
        let urls = RedirectUrls::for_domain("www.wizbook.io");
        assert!(urls.success.starts_with("https://www.wizbook.io/success"));
        assert!(urls.success.contains("{CHECKOUT_SESSION_ID}"));
        assert_eq!(urls.cancel, "https://www.wizbook.io/cancel");
    }
}
