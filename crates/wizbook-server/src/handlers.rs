//! HTTP Handlers

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use wizbook_core::{ContentError, GenerateRequest};
use wizbook_payments::{normalize_email, CaptureStore, EmailCapture, PaymentError, TierId};
use wizbook_pdf::{render_pdf, title_from_markdown};

use crate::ratelimit::{Decision, Route};
use crate::state::AppState;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Handler-level error carrying the HTTP mapping of the failure taxonomy
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    retry_after: Option<u64>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            retry_after: None,
        }
    }

    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            code: "RATE_LIMITED",
            message: format!("Too many requests. Retry in {retry_after_secs}s."),
            retry_after: Some(retry_after_secs),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
            code: self.code.to_string(),
        });
        let mut response = (self.status, body).into_response();
        if let Some(secs) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        let message = err.to_string();
        match err {
            PaymentError::InvalidInput(_) => Self::bad_request("INVALID_INPUT", message),
            PaymentError::InvalidTier(_) => Self::bad_request("INVALID_TIER", message),
            PaymentError::InvalidUpsell(_) => Self::bad_request("INVALID_UPSELL", message),
            PaymentError::InvalidEmail(_) => Self::bad_request("INVALID_EMAIL", message),
            PaymentError::InvalidSignature(_) => Self::bad_request("INVALID_SIGNATURE", message),
            PaymentError::WebhookParse(_) => Self::bad_request("WEBHOOK_PARSE", message),
            PaymentError::UnknownSession(_) => {
                Self::new(StatusCode::NOT_FOUND, "UNKNOWN_SESSION", message)
            }
            PaymentError::Stripe(_) => Self::new(
                StatusCode::BAD_GATEWAY,
                "PAYMENT_PROVIDER",
                err.user_message(),
            ),
            PaymentError::Config(_) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "CONFIG", err.user_message())
            }
            PaymentError::Storage(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE",
                err.user_message(),
            ),
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::InvalidInput(_) => Self::bad_request("INVALID_INPUT", err.to_string()),
            other => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "GENERATION",
                other.user_message(),
            ),
        }
    }
}

// ============================================================================
// Rate limiting plumbing
// ============================================================================

/// Client key: first X-Forwarded-For hop, else the peer address
fn client_key(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

fn check_limit(
    state: &AppState,
    headers: &HeaderMap,
    addr: SocketAddr,
    route: Route,
) -> Result<(u32, u64), ApiError> {
    let client = client_key(headers, addr);
    match state.limiter.check(&client, route) {
        Decision::Allowed {
            remaining,
            reset_secs,
        } => Ok((remaining, reset_secs)),
        Decision::Denied { retry_after_secs } => {
            tracing::debug!(client = %client, route = route.as_str(), "rate limited");
            Err(ApiError::rate_limited(retry_after_secs))
        }
    }
}

/// Attach quota headers to a successful response
fn with_quota(remaining: u32, reset_secs: u64, inner: impl IntoResponse) -> Response {
    let mut response = inner.into_response();
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(reset_secs));
    response
}

// ============================================================================
// Health & pricing
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub providers: Vec<String>,
    pub stripe_configured: bool,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        providers: state
            .generator
            .provider_names()
            .iter()
            .map(ToString::to_string)
            .collect(),
        stripe_configured: state.checkout.live(),
    })
}

#[derive(Serialize)]
pub struct PricingResponse {
    pub tiers: Vec<wizbook_payments::PricingTier>,
    pub upsells: Vec<wizbook_payments::Upsell>,
}

pub async fn pricing(State(state): State<AppState>) -> Json<PricingResponse> {
    Json(PricingResponse {
        tiers: state.catalog.tiers().to_vec(),
        upsells: state.catalog.upsells().to_vec(),
    })
}

// ============================================================================
// Generation
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct GenerateParams {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    /// Tier sets the target book length
    #[serde(default)]
    pub tier: Option<String>,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub text: String,
    pub topic: String,
    pub word_count: usize,
    pub provider: String,
}

pub async fn generate_get(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<GenerateParams>,
) -> Result<Response, ApiError> {
    generate_inner(state, addr, headers, params).await
}

pub async fn generate_post(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(params): Json<GenerateParams>,
) -> Result<Response, ApiError> {
    generate_inner(state, addr, headers, params).await
}

async fn generate_inner(
    state: AppState,
    addr: SocketAddr,
    headers: HeaderMap,
    params: GenerateParams,
) -> Result<Response, ApiError> {
    let (remaining, reset) = check_limit(&state, &headers, addr, Route::Generate)?;

    let request = GenerateRequest {
        topic: params.topic.unwrap_or_default(),
        audience: params.audience,
        style: params.style,
        tier: params.tier,
    };
    let content = state.generator.generate(&request).await?;

    Ok(with_quota(
        remaining,
        reset,
        Json(GenerateResponse {
            text: content.body,
            topic: content.topic,
            word_count: content.word_count,
            provider: content.provider,
        }),
    ))
}

// ============================================================================
// PDF export
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
}

pub async fn export_pdf(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    let (remaining, reset) = check_limit(&state, &headers, addr, Route::Export)?;

    if payload.text.trim().is_empty() {
        return Err(ApiError::bad_request("INVALID_INPUT", "text is required"));
    }

    let title = payload
        .title
        .clone()
        .or_else(|| title_from_markdown(&payload.text).map(str::to_string))
        .unwrap_or_else(|| "Generated Book".into());

    let bytes = render_pdf(&title, &payload.text).map_err(|e| {
        tracing::error!(error = %e, "pdf rendering failed");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "PDF_ERROR",
            "PDF rendering failed",
        )
    })?;

    let pdf = (
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"book.pdf\"",
            ),
        ],
        bytes,
    );
    Ok(with_quota(remaining, reset, pdf))
}

// ============================================================================
// Checkout
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutQuery {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    /// Comma-separated upsell ids
    #[serde(default)]
    pub upsells: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutBody {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub upsells: Vec<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub order_id: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    pub demo: bool,
    pub total_cents: i64,
}

pub async fn checkout_get(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<CheckoutQuery>,
) -> Result<Response, ApiError> {
    let upsells = query
        .upsells
        .map(|raw| {
            raw.split(',')
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect()
        })
        .unwrap_or_default();
    checkout_inner(state, addr, headers, query.topic, query.tier, upsells, query.email).await
}

pub async fn checkout_post(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<CheckoutBody>,
) -> Result<Response, ApiError> {
    checkout_inner(state, addr, headers, body.topic, body.tier, body.upsells, body.email).await
}

async fn checkout_inner(
    state: AppState,
    addr: SocketAddr,
    headers: HeaderMap,
    topic: Option<String>,
    tier: Option<String>,
    upsells: Vec<String>,
    email: Option<String>,
) -> Result<Response, ApiError> {
    let (remaining, reset) = check_limit(&state, &headers, addr, Route::Checkout)?;

    let topic = topic.unwrap_or_else(|| "General Book".into());
    let tier = TierId::parse(tier.as_deref().unwrap_or("pro"))?;
    let email = email
        .filter(|e| !e.trim().is_empty())
        .map(|e| normalize_email(&e))
        .transpose()?;

    let handle = state
        .checkout
        .start_checkout(&topic, tier, upsells, email)
        .await?;

    Ok(with_quota(
        remaining,
        reset,
        Json(CheckoutResponse {
            order_id: handle.order_id.to_string(),
            session_id: handle.session_id,
            checkout_url: handle.checkout_url,
            demo: handle.demo,
            total_cents: handle.total_cents,
        }),
    ))
}

// ============================================================================
// Email capture
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub email: String,
    #[serde(default)]
    pub tier_interest: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub status: &'static str,
    pub email: String,
}

pub async fn capture_email(
    State(state): State<AppState>,
    Json(payload): Json<CaptureRequest>,
) -> Result<Json<CaptureResponse>, ApiError> {
    let tier_interest = payload
        .tier_interest
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(TierId::parse)
        .transpose()?;

    let capture = EmailCapture::new(&payload.email, tier_interest, payload.topic)?;
    let email = capture.email.clone();
    state.captures.append(capture)?;

    tracing::info!(email = %email, "captured email");
    Ok(Json(CaptureResponse {
        status: "success",
        email,
    }))
}

// ============================================================================
// Webhook & session polling
// ============================================================================

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookAck>, ApiError> {
    let reconciler = state.reconciler.as_ref().ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "PAYMENTS_DISABLED",
            "Payments not configured",
        )
    })?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("MISSING_SIGNATURE", "Missing Stripe signature"))?;

    reconciler.reconcile(&body, signature).await?;
    Ok(Json(WebhookAck { status: "success" }))
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub order_id: String,
    pub status: &'static str,
    pub tier: String,
    pub topic: String,
    pub total_cents: i64,
    pub demo: bool,
}

pub async fn session_status(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> Result<Response, ApiError> {
    let (remaining, reset) = check_limit(&state, &headers, addr, Route::Session)?;

    let order = state
        .checkout
        .session_status(&query.session_id)?
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::NOT_FOUND,
                "UNKNOWN_SESSION",
                format!("no order for session {}", query.session_id),
            )
        })?;

    Ok(with_quota(
        remaining,
        reset,
        Json(SessionResponse {
            order_id: order.id.to_string(),
            status: order.status.as_str(),
            tier: order.tier.to_string(),
            topic: order.topic,
            total_cents: order.total_cents,
            demo: order.demo,
        }),
    ))
}
