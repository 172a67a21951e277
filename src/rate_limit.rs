//! Global request throttling for the settlement endpoints.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Build a process-wide limiter allowing `requests_per_minute`.
pub fn build_rate_limiter(requests_per_minute: u32) -> SharedRateLimiter {
    let quota = Quota::per_minute(
        NonZeroU32::new(requests_per_minute.max(1)).expect("clamped to at least 1"),
    );
    Arc::new(RateLimiter::direct(quota))
}

/// Middleware rejecting requests above the configured rate.
pub async fn throttle(limiter: SharedRateLimiter, request: Request, next: Next) -> Response {
    match limiter.check() {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!("Request rejected by rate limiter");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded. Please retry later.",
            )
                .into_response()
        }
    }
}
