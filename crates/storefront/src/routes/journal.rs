//! Journal (blog) endpoints. Only published posts are visible.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::models::BlogPost;
use crate::state::AppState;

/// GET /api/journal
#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> Json<Vec<BlogPost>> {
    Json(state.catalog().published_posts().await.as_ref().clone())
}

/// GET /api/journal/{slug}
#[instrument(skip(state))]
pub async fn show_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Json<Option<BlogPost>> {
    Json(state.catalog().post_by_slug(&slug).await)
}
