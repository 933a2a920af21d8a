//! Page selector resolution.

use axum::{Json, extract::Query};
use serde::{Deserialize, Serialize};

use crate::navigation::Page;

/// Query parameters: a page name and optional parameter.
#[derive(Debug, Default, Deserialize)]
pub struct NavigationQuery {
    #[serde(default)]
    pub page: String,
    pub param: Option<String>,
}

/// A resolved page and its canonical path.
#[derive(Debug, Serialize)]
pub struct NavigationTarget {
    #[serde(flatten)]
    pub page: Page,
    pub path: String,
}

/// GET /api/navigation?page=<name>&param=<p>
///
/// Unknown pages resolve to home.
pub async fn resolve(Query(query): Query<NavigationQuery>) -> Json<NavigationTarget> {
    let page = Page::from_parts(&query.page, query.param.as_deref());
    Json(NavigationTarget {
        path: page.path(),
        page,
    })
}
