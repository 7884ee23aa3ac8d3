//! Application State

use std::sync::Arc;

use wizbook_core::Generator;
use wizbook_payments::{Catalog, CheckoutService, MemoryCaptureStore, MemoryOrderStore, Reconciler};

use crate::ratelimit::FixedWindowLimiter;

/// Shared application state, injected into every handler
#[derive(Clone)]
pub struct AppState {
    /// Content generator (provider chain + template fallback)
    pub generator: Arc<Generator>,

    /// Pricing catalog
    pub catalog: Arc<Catalog>,

    /// Checkout orchestrator over the order store
    pub checkout: Arc<CheckoutService<MemoryOrderStore>>,

    /// Webhook reconciler (None when no signing secret is configured)
    pub reconciler: Option<Arc<Reconciler<MemoryOrderStore>>>,

    /// Email capture store
    pub captures: Arc<MemoryCaptureStore>,

    /// Fixed-window rate limiter
    pub limiter: Arc<FixedWindowLimiter>,
}
