//! wizbook HTTP Server
//!
//! Axum-based server exposing the generation, export, and checkout API.

mod config;
mod handlers;
mod ratelimit;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wizbook_core::{Generator, GeneratorConfig, TextProvider};
use wizbook_payments::{
    Catalog, CheckoutService, LogFulfillment, MemoryCaptureStore, MemoryOrderStore,
    PaymentGateway, Reconciler, RedirectUrls, StripeGateway,
};
use wizbook_runtime::ChatProvider;

use crate::config::Config;
use crate::handlers::{
    capture_email, checkout_get, checkout_post, export_pdf, generate_get, generate_post,
    health_check, pricing, session_status, stripe_webhook,
};
use crate::ratelimit::FixedWindowLimiter;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // Initialize text providers, priority order
    let mut providers: Vec<Arc<dyn TextProvider>> = Vec::new();
    match ChatProvider::primary_from_env() {
        Some(provider) => {
            tracing::info!("✓ Primary provider configured: {}", provider.name());
            providers.push(Arc::new(provider));
        }
        None => {
            tracing::warn!("⚠ No LLM key configured - generation uses the template writer");
            tracing::warn!("  Set LLM_API_KEY in .env to enable AI generation");
        }
    }
    if let Some(provider) = ChatProvider::secondary_from_env() {
        tracing::info!("✓ Secondary provider configured: {}", provider.name());
        providers.push(Arc::new(provider));
    }
    let generator = Arc::new(Generator::new(providers, GeneratorConfig::default()));

    // Initialize catalog and stores
    let catalog = Arc::new(Catalog::standard());
    let orders = Arc::new(MemoryOrderStore::new());
    let captures = Arc::new(MemoryCaptureStore::new());

    // Initialize payments
    let gateway: Option<Arc<dyn PaymentGateway>> = match &config.stripe_secret_key {
        Some(key) => {
            tracing::info!("✓ Stripe configured");
            Some(Arc::new(StripeGateway::new(key)))
        }
        None => {
            tracing::warn!("⚠ Stripe not configured - checkout runs in demo mode");
            tracing::warn!("  Set STRIPE_SECRET_KEY and STRIPE_WEBHOOK_SECRET in .env");
            None
        }
    };
    let checkout = Arc::new(CheckoutService::new(
        catalog.clone(),
        orders.clone(),
        gateway,
        RedirectUrls::for_domain(&config.domain),
    ));
    let reconciler = config.stripe_webhook_secret.as_ref().map(|secret| {
        Arc::new(Reconciler::new(
            orders.clone(),
            Arc::new(LogFulfillment),
            secret.clone(),
        ))
    });
    if reconciler.is_none() {
        tracing::warn!("⚠ No webhook secret - /api/webhook disabled");
    }

    // Rate limiter, validated at startup
    let limiter = Arc::new(FixedWindowLimiter::new(config.limits)?);

    // Periodic eviction of expired windows
    let purge_limiter = limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            purge_limiter.purge_expired();
        }
    });

    // Build application state
    let state = AppState {
        generator,
        catalog,
        checkout,
        reconciler,
        captures,
        limiter,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health & catalog
        .route("/health", get(health_check))
        .route("/api/pricing", get(pricing))
        // Generation & export
        .route("/api/generate", get(generate_get).post(generate_post))
        .route("/api/export", post(export_pdf))
        // Checkout
        .route("/api/checkout", get(checkout_get).post(checkout_post))
        .route("/api/capture-email", post(capture_email))
        .route("/api/webhook", post(stripe_webhook))
        .route("/api/session", get(session_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 wizbook server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health            - Health check");
    tracing::info!("  GET  /api/pricing       - Pricing tiers and upsells");
    tracing::info!("  GET  /api/generate      - Generate book text");
    tracing::info!("  POST /api/export        - Export text as watermarked PDF");
    tracing::info!("  GET  /api/checkout      - Create checkout session");
    tracing::info!("  POST /api/capture-email - Capture marketing email");
    tracing::info!("  POST /api/webhook       - Stripe webhook");
    tracing::info!("  GET  /api/session       - Poll payment status");
    tracing::info!("");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
