//! Fixed-Window Rate Limiting
//!
//! Per-route, per-client request quotas over fixed time windows. Counters
//! live in process memory behind a mutex; the check-and-increment is a
//! single locked mutation, so concurrent requests against the same key
//! cannot lose updates. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Logical endpoints with independent quotas
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Generate,
    Export,
    Checkout,
    Session,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Generate => "generate",
            Route::Export => "export",
            Route::Checkout => "checkout",
            Route::Session => "session",
        }
    }
}

/// Quota for one route
#[derive(Clone, Copy, Debug)]
pub struct RouteLimit {
    /// Requests allowed per window; zero denies everything
    pub limit: u32,

    /// Window length
    pub window: Duration,
}

impl RouteLimit {
    pub fn per_minute(limit: u32) -> Self {
        Self {
            limit,
            window: Duration::from_secs(60),
        }
    }
}

/// Per-route quota table
#[derive(Clone, Copy, Debug)]
pub struct RouteLimits {
    pub generate: RouteLimit,
    pub export: RouteLimit,
    pub checkout: RouteLimit,
    pub session: RouteLimit,
}

impl Default for RouteLimits {
    fn default() -> Self {
        Self {
            generate: RouteLimit::per_minute(10),
            export: RouteLimit::per_minute(20),
            checkout: RouteLimit::per_minute(5),
            session: RouteLimit::per_minute(10),
        }
    }
}

impl RouteLimits {
    fn for_route(&self, route: Route) -> RouteLimit {
        match route {
            Route::Generate => self.generate,
            Route::Export => self.export,
            Route::Checkout => self.checkout,
            Route::Session => self.session,
        }
    }

    /// Reject nonsensical configuration at startup
    pub fn validate(&self) -> anyhow::Result<()> {
        for route in [Route::Generate, Route::Export, Route::Checkout, Route::Session] {
            if self.for_route(route).window.is_zero() {
                anyhow::bail!("rate limit window for {} must be positive", route.as_str());
            }
        }
        Ok(())
    }
}

/// Outcome of a quota check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Request admitted; carries data for client-facing headers
    Allowed {
        /// Requests left in the current window
        remaining: u32,
        /// Seconds until the window resets
        reset_secs: u64,
    },
    /// Request rejected
    Denied {
        /// Seconds until the window resets
        retry_after_secs: u64,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window limiter keyed by (client, route)
pub struct FixedWindowLimiter {
    limits: RouteLimits,
    windows: Mutex<HashMap<(String, Route), Window>>,
}

impl FixedWindowLimiter {
    /// Create a limiter, validating the configuration
    pub fn new(limits: RouteLimits) -> anyhow::Result<Self> {
        limits.validate()?;
        Ok(Self {
            limits,
            windows: Mutex::new(HashMap::new()),
        })
    }

    /// Check and record one request for a client on a route
    ///
    /// A new or expired window starts at count 1 and admits the request.
    /// Within a window the counter saturates at the limit; denied requests
    /// do not consume quota.
    pub fn check(&self, client: &str, route: Route) -> Decision {
        let limit = self.limits.for_route(route);
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap();

        let window = windows
            .entry((client.to_string(), route))
            .or_insert(Window {
                started: now,
                count: 0,
            });

        if now.duration_since(window.started) >= limit.window {
            window.started = now;
            window.count = 0;
        }

        let until_reset = limit.window - now.duration_since(window.started);
        if window.count < limit.limit {
            window.count += 1;
            Decision::Allowed {
                remaining: limit.limit - window.count,
                reset_secs: ceil_secs(until_reset),
            }
        } else {
            Decision::Denied {
                retry_after_secs: ceil_secs(until_reset),
            }
        }
    }

    /// Drop windows that have fully expired, bounding memory growth
    pub fn purge_expired(&self) {
        let now = Instant::now();
        let limits = self.limits;
        let mut windows = self.windows.lock().unwrap();
        windows.retain(|(_, route), window| {
            now.duration_since(window.started) < limits.for_route(*route).window
        });
    }

    /// Number of live windows (diagnostics)
    pub fn tracked_windows(&self) -> usize {
        self.windows.lock().unwrap().len()
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}
