//! Rate limiting for authentication endpoints.
//!
//! Token bucket per client IP on the credential-bearing endpoints (login,
//! register). Everything else is unthrottled.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc};

/// Per-IP keyed rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting configuration for authentication endpoints.
pub struct RateLimitConfig {
    /// Login attempts: 5 per second with a burst of 20 per IP
    pub login: IpLimiter,
    /// Registrations: 2 per second with a burst of 10 per IP
    pub register: IpLimiter,
}

impl RateLimitConfig {
    pub fn new() -> Self {
        Self {
            login: RateLimiter::keyed(
                Quota::per_second(NonZeroU32::new(5).unwrap())
                    .allow_burst(NonZeroU32::new(20).unwrap()),
            ),
            register: RateLimiter::keyed(
                Quota::per_second(NonZeroU32::new(2).unwrap())
                    .allow_burst(NonZeroU32::new(10).unwrap()),
            ),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort client key: forwarded header, then socket address, then a
/// shared bucket for clients with neither.
fn client_key(request: &Request) -> String {
    if let Some(forwarded_for) = request.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded_for.to_str() {
            if let Some(first_ip) = value.split(',').next() {
                let ip = first_ip.trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    use axum::extract::ConnectInfo;
    use std::net::SocketAddr;
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "local".to_string())
}

fn too_many_requests() -> Response {
    // Not part of the error taxonomy: a plain 429 with the envelope shape
    let message = "Too many requests. Please try again later.";
    (
        StatusCode::TOO_MANY_REQUESTS,
        axum::Json(serde_json::json!({
            "success": false,
            "statusCode": 429,
            "message": message,
            "errors": [message],
        })),
    )
        .into_response()
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    match config.login.check_key(&key) {
        Ok(_) => next.run(request).await,
        Err(_) => too_many_requests(),
    }
}

/// Middleware for rate limiting registrations.
pub async fn rate_limit_register(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    match config.register.check_key(&key) {
        Ok(_) => next.run(request).await,
        Err(_) => too_many_requests(),
    }
}
