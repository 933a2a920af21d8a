//! Anonymous shopper identity.
//!
//! Every visitor gets a `ShopperId` on first need. It is stored in the
//! session and reused on every later request, so the cart follows the
//! session cookie. Anyone holding the cookie can act on that cart.

use axum::{extract::FromRequestParts, http::request::Parts};
use luma_core::ShopperId;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session::keys;

/// Extractor yielding the current shopper, creating one if the session has
/// none yet.
///
/// Requires the session layer; without it the request fails with a 500.
///
/// # Example
///
/// ```rust,ignore
/// async fn cart_count(State(state): State<AppState>, Shopper(shopper): Shopper) -> String {
///     state.cart_for(shopper).count().await.unwrap_or(0).to_string()
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Shopper(pub ShopperId);

impl<S> FromRequestParts<S> for Shopper
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        shopper_id(session).await.map(Self)
    }
}

/// Get the shopper id stored in `session`, generating and storing a new one
/// if absent.
///
/// A stored value that no longer decodes is replaced.
///
/// # Errors
///
/// Returns `AppError::Internal` if the session store cannot be written.
pub async fn shopper_id(session: &Session) -> Result<ShopperId, AppError> {
    match session.get::<ShopperId>(keys::SHOPPER_ID).await {
        Ok(Some(id)) => return Ok(id),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Unreadable shopper id in session, replacing"),
    }

    let id = ShopperId::generate();
    session
        .insert(keys::SHOPPER_ID, id)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store shopper id: {e}")))?;

    tracing::debug!(shopper_id = %id, "New shopper");
    Ok(id)
}
