//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, Postgres or memory store)
//! 5. Rate limiting on form submissions (governor)
//!
//! The [`Shopper`] extractor reads the session set up by layer 4.

pub mod rate_limit;
pub mod request_id;
pub mod session;
pub mod shopper;

pub use rate_limit::form_rate_limiter;
pub use request_id::request_id_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer, postgres_session_store};
pub use shopper::Shopper;
