//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Bodies are JSON: `{"error": "..."}`, plus `"fields"` for validation failures.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::{CartError, CheckoutError, FieldErrors, ORDER_FAILED_MESSAGE};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Order could not be placed. The client only sees the generic message.
    #[error("Checkout failed: {0}")]
    OrderFailed(#[source] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Form fields failed validation.
    #[error("Validation failed: {} field(s)", .0.len())]
    Validation(FieldErrors),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Invalid(fields) => Self::Validation(fields),
            CheckoutError::EmptyCart => Self::BadRequest("Your cart is empty".to_string()),
            other => Self::OrderFailed(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a FieldErrors>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Cart(_) | Self::OrderFailed(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::OrderFailed(_) => ORDER_FAILED_MESSAGE.to_string(),
            Self::Cart(_) | Self::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::BadRequest(msg) => msg.clone(),
            Self::Validation(_) => "Please correct the highlighted fields".to_string(),
            Self::RateLimited => "Too many requests. Please wait and try again.".to_string(),
        };

        let fields = match &self {
            Self::Validation(fields) => Some(fields),
            _ => None,
        };

        (
            status,
            Json(ErrorBody {
                error: &message,
                fields,
            }),
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use luma_core::OrderId;

    use crate::db::StoreError;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::BadRequest("test".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Validation(FieldErrors::new()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::Internal("test".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_checkout_error_mapping() {
        assert!(matches!(
            AppError::from(CheckoutError::EmptyCart),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(CheckoutError::Invalid(FieldErrors::new())),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(CheckoutError::CreateOrder(StoreError::Unavailable(
                "down".to_string()
            ))),
            AppError::OrderFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_order_failure_hides_cause() {
        let err = AppError::from(CheckoutError::AddItems {
            order_id: OrderId::generate(),
            source: StoreError::DataCorruption("secret detail".to_string()),
        });
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], ORDER_FAILED_MESSAGE);
        assert!(!body.to_string().contains("secret detail"));
    }

    #[tokio::test]
    async fn test_rate_limited_body_is_json() {
        let (status, body) = body_json(AppError::RateLimited).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Too many requests. Please wait and try again.");
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let mut fields = FieldErrors::new();
        fields.insert("email", "Enter a valid email address".to_string());
        let (status, body) = body_json(AppError::Validation(fields)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"]["email"], "Enter a valid email address");
    }
}
