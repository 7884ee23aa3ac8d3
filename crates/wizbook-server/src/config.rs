//! Environment Configuration
//!
//! All deployment knobs come from the environment (or `.env` during
//! development). Nonsensical rate-limit configuration fails startup rather
//! than producing a limiter that never resets.

use std::time::Duration;

use anyhow::Context;

use crate::ratelimit::{RouteLimit, RouteLimits};

/// Server configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Address the server binds to
    pub bind_addr: String,

    /// Deployment domain used for checkout redirect URLs
    pub domain: String,

    /// Stripe API key; absent means demo-mode checkout
    pub stripe_secret_key: Option<String>,

    /// Stripe webhook signing secret; absent disables reconciliation
    pub stripe_webhook_secret: Option<String>,

    /// Per-route rate limits
    pub limits: RouteLimits,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
        let domain = std::env::var("DOMAIN").unwrap_or_else(|_| "www.wizbook.io".into());

        let stripe_secret_key = non_empty_var("STRIPE_SECRET_KEY");
        let stripe_webhook_secret = non_empty_var("STRIPE_WEBHOOK_SECRET");

        let window_secs = env_u64("RATE_LIMIT_WINDOW_SECS", 60)?;
        if window_secs == 0 {
            anyhow::bail!("RATE_LIMIT_WINDOW_SECS must be positive");
        }
        let window = Duration::from_secs(window_secs);

        let defaults = RouteLimits::default();
        let limits = RouteLimits {
            generate: RouteLimit {
                limit: env_u32("RATE_LIMIT_GENERATE", defaults.generate.limit)?,
                window,
            },
            export: RouteLimit {
                limit: env_u32("RATE_LIMIT_EXPORT", defaults.export.limit)?,
                window,
            },
            checkout: RouteLimit {
                limit: env_u32("RATE_LIMIT_CHECKOUT", defaults.checkout.limit)?,
                window,
            },
            session: RouteLimit {
                limit: env_u32("RATE_LIMIT_SESSION", defaults.session.limit)?,
                window,
            },
        };
        limits.validate()?;

        Ok(Self {
            bind_addr,
            domain,
            stripe_secret_key,
            stripe_webhook_secret,
            limits,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_u32(name: &str, default: u32) -> anyhow::Result<u32> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{name} must be an integer, got {value:?}")),
        Err(_) => Ok(default),
    }
}

fn env_u64(name: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{name} must be an integer, got {value:?}")),
        Err(_) => Ok(default),
    }
}
