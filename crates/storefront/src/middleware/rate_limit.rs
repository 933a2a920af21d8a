//! Rate limiting for the form endpoints (checkout and contact).
//!
//! Clients are keyed by IP as reported by the proxy in front of the
//! storefront. Requests with no recognisable client IP are rejected with a
//! 400 rather than sharing one bucket. Rejections use the same JSON error
//! body as every other endpoint.

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::{HeaderMap, Request};
use axum::response::{IntoResponse, Response};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::AppError;

/// Headers consulted for the client IP, most trusted first.
const CLIENT_IP_HEADERS: [&str; 4] = [
    "cf-connecting-ip",
    "x-forwarded-for",
    "x-real-ip",
    "fly-client-ip",
];

/// Seconds to replenish one request token.
const FORM_REPLENISH_SECONDS: u64 = 6;

/// Requests a client may make back to back.
const FORM_BURST: u32 = 5;

/// Key extractor that reads the client IP from proxy headers.
#[derive(Debug, Clone, Copy)]
pub struct ProxyIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ProxyIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req.headers()).ok_or(GovernorError::UnableToExtractKey)
    }
}

/// First parseable client IP in [`CLIENT_IP_HEADERS`] order.
///
/// `x-forwarded-for` may carry a chain; the left-most entry is the client.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    CLIENT_IP_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    })
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ProxyIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Limiter for form submissions: burst of 5, then one every 6 seconds per IP.
///
/// # Panics
///
/// Never: both settings are non-zero constants, which `GovernorConfigBuilder`
/// always accepts.
#[must_use]
pub fn form_rate_limiter() -> RateLimiterLayer {
    #[allow(clippy::expect_used)]
    let config = GovernorConfigBuilder::default()
        .key_extractor(ProxyIpKeyExtractor)
        .per_second(FORM_REPLENISH_SECONDS)
        .burst_size(FORM_BURST)
        .finish()
        .expect("non-zero replenish period and burst size");
    GovernorLayer::new(Arc::new(config)).error_handler(rejection_response)
}

/// JSON response for a request the limiter turned away.
///
/// Keeps the `retry-after` and `x-ratelimit-*` headers governor attaches.
fn rejection_response(err: GovernorError) -> Response {
    match err {
        GovernorError::TooManyRequests { wait_time, headers } => {
            tracing::warn!(wait_time, "Form rate limit exceeded");
            let mut response = AppError::RateLimited.into_response();
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
        GovernorError::UnableToExtractKey => {
            AppError::BadRequest("Unable to determine client address".to_string()).into_response()
        }
        GovernorError::Other { code, msg, .. } => {
            AppError::Internal(format!("rate limiter: {code} {}", msg.unwrap_or_default()))
                .into_response()
        }
    }
}
