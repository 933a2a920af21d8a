//! Integration tests for the Luma Living storefront.
//!
//! Tests drive the full axum router (sessions, rate limiting, request IDs)
//! in process against the in-memory backend seeded with the demo catalog.
//! No database or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p luma-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_health() {
//!     let ctx = TestContext::new();
//!     let mut client = ctx.client();
//!     let resp = client.get("/health").await;
//!     assert_eq!(resp.status, StatusCode::OK);
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use luma_storefront::{
    config::StorefrontConfig,
    db::{MemoryStore, seed::demo_memory_store},
    middleware::{SESSION_COOKIE_NAME, create_session_layer},
    state::AppState,
};
use serde_json::Value;
use tower::ServiceExt;

/// A storefront app over a fresh in-memory store.
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    next_client: AtomicU8,
}

impl TestContext {
    /// Build the app with the demo catalog loaded.
    ///
    /// # Panics
    ///
    /// Panics if the demo catalog or default configuration is invalid.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let config = StorefrontConfig::in_memory().expect("default configuration");
        let store = demo_memory_store(chrono::Utc::now()).expect("demo catalog");
        let session_layer =
            create_session_layer(tower_sessions::MemoryStore::default(), &config);
        let app = luma_storefront::app(AppState::memory(config, &store), session_layer);

        Self {
            app,
            store,
            next_client: AtomicU8::new(1),
        }
    }

    /// A client with its own cookie jar and client IP.
    #[must_use]
    pub fn client(&self) -> TestClient {
        let n = self.next_client.fetch_add(1, Ordering::Relaxed);
        TestClient {
            app: self.app.clone(),
            cookie: None,
            ip: format!("203.0.113.{n}"),
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A browser-like client: remembers the session cookie between requests.
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
    ip: String,
}

/// A response with its body parsed as JSON (`Null` if empty or not JSON).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestClient {
    /// Send a request, keeping any session cookie the server sets.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the router fails.
    #[allow(clippy::expect_used)]
    pub async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", &self.ip);

        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(cookie) = session_cookie(response.headers()) {
            self.cookie = Some(cookie);
        }

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn patch(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }

    /// Forget the session cookie, as a new browser would.
    pub fn clear_cookies(&mut self) {
        self.cookie = None;
    }

    /// Whether the server has issued a session cookie.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.cookie.is_some()
    }
}

/// The `name=value` part of the session `Set-Cookie` header, if any.
fn session_cookie(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")))
        .map(str::to_string)
}

/// Look up a demo product's id by slug.
///
/// # Panics
///
/// Panics if the slug is not in the demo catalog.
#[allow(clippy::expect_used)]
pub async fn product_id(client: &mut TestClient, slug: &str) -> String {
    let resp = client.get(&format!("/api/products/{slug}")).await;
    resp.body["id"]
        .as_str()
        .expect("demo product exists")
        .to_string()
}
