//! # wizbook-payments
//!
//! Pricing catalog, order tracking, and Stripe checkout for wizbook.
//!
//! ## Checkout flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │  Your Site  │────▶│  Stripe Hosted  │────▶│  Your Site  │
//! │  (pricing)  │     │  Checkout Page  │     │  (success)  │
//! └─────────────┘     └────────┬────────┘     └─────────────┘
//!                              │ webhook
//!                              ▼
//!                     ┌─────────────────┐
//!                     │   Reconciler    │──▶ order paid ──▶ fulfillment
//!                     └─────────────────┘
//! ```
//!
//! The order lives in the store from session creation until the webhook
//! settles it. When Stripe is unreachable or unconfigured, checkout degrades
//! to an explicit demo mode with a fabricated session reference, so the rest
//! of the product keeps working without live payments.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wizbook_payments::{Catalog, CheckoutService, MemoryOrderStore, RedirectUrls, TierId};
//!
//! let service = CheckoutService::new(catalog, orders, Some(gateway), urls);
//! let handle = service.start_checkout("Rust", TierId::Pro, vec![], None).await?;
//! // Redirect user to: handle.checkout_url (or report handle.demo)
//! ```

mod capture;
mod catalog;
mod checkout;
mod error;
mod gateway;
mod order;
mod webhook;

pub use capture::{normalize_email, CaptureStore, EmailCapture, MemoryCaptureStore};
pub use catalog::{Catalog, PricingTier, TierId, Upsell};
pub use checkout::{CheckoutHandle, CheckoutService};
pub use error::{PaymentError, Result};
pub use gateway::{GatewaySession, PaymentGateway, RedirectUrls, StripeGateway};
pub use order::{MemoryOrderStore, Order, OrderId, OrderStatus, OrderStore, Transition};
pub use webhook::{sign_payload, verify_signature, Ack, Fulfillment, LogFulfillment, Reconciler};
