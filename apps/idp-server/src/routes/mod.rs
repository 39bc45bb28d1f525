//! Route modules for the IDP server

pub mod extract;
pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::config::RateLimitConfig;
use crate::rate_limit::{self, RateLimiter};
use crate::state::AppState;

/// Routes mounted under `/api/v1`, each with its own rate limiter
pub fn router(limits: &RateLimitConfig) -> Router<AppState> {
    let extract_limiter = RateLimiter::per_minute(limits.extract_per_minute);
    let health_limiter = RateLimiter::per_minute(limits.health_per_minute);

    Router::new()
        .route(
            "/extract",
            post(extract::extract_document).layer(middleware::from_fn_with_state(
                extract_limiter,
                rate_limit::enforce,
            )),
        )
        .route(
            "/health",
            get(health::health_check).layer(middleware::from_fn_with_state(
                health_limiter,
                rate_limit::enforce,
            )),
        )
}
