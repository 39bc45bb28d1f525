//! Per-client request rate limiting
//!
//! A `governor` keyed limiter per route, keyed by client address. A client
//! may burst up to the per-minute quota and regains one request every
//! `60 / quota` seconds. Idle clients are pruned once the table grows.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota};

use crate::error::ErrorResponse;

/// Tracked clients above which idle entries are dropped
const PRUNE_THRESHOLD: usize = 10_000;

/// Limiter shared across requests of one route
#[derive(Clone)]
pub struct RateLimiter {
    limit: u32,
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
    clock: DefaultClock,
}

/// Outcome of a rejected request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub limit: u32,
    pub retry_after: Duration,
}

impl RateLimiter {
    /// Allow `limit` requests per client per minute.
    ///
    /// Zero is rejected at config load and treated as one here.
    pub fn per_minute(limit: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN));
        Self {
            limit: quota.burst_size().get(),
            limiter: Arc::new(DefaultKeyedRateLimiter::keyed(quota)),
            clock: DefaultClock::default(),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Count one request for `client`
    pub fn check(&self, client: &str) -> Result<(), RateLimited> {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }

        self.limiter
            .check_key(&client.to_string())
            .map_err(|not_until| RateLimited {
                limit: self.limit,
                retry_after: not_until.wait_time_from(self.clock.now()),
            })
    }
}

impl IntoResponse for RateLimited {
    fn into_response(self) -> Response {
        let detail = format!("Rate limit exceeded: {} per 1 minute", self.limit);
        let mut response =
            (StatusCode::TOO_MANY_REQUESTS, Json(ErrorResponse::new(detail))).into_response();

        // Round up so clients never retry before the next allowed request
        let secs = self.retry_after.as_secs() + u64::from(self.retry_after.subsec_nanos() > 0);
        if let Ok(value) = HeaderValue::from_str(&secs.max(1).to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}

/// Middleware rejecting requests over the route's limit
pub async fn enforce(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimited> {
    let client = client_key(
        request.extensions().get::<ConnectInfo<SocketAddr>>(),
        request.headers(),
    );

    if let Err(limited) = limiter.check(&client) {
        tracing::warn!(client = %client, limit = limited.limit, "Rate limit exceeded");
        return Err(limited);
    }

    Ok(next.run(request).await)
}

/// Peer address, else the first `X-Forwarded-For` hop, else "unknown"
fn client_key(connect_info: Option<&ConnectInfo<SocketAddr>>, headers: &HeaderMap) -> String {
    if let Some(ConnectInfo(addr)) = connect_info {
        return addr.ip().to_string();
    }

    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}
