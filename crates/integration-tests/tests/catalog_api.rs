//! Catalog, journal, navigation and health endpoints.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use luma_integration_tests::TestContext;
use serde_json::Value;

fn slugs(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|v| v["slug"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();
    let mut client = ctx.client();

    assert_eq!(client.get("/health").await.status, StatusCode::OK);
    assert_eq!(client.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_featured_products_newest_first() {
    let ctx = TestContext::new();
    let mut client = ctx.client();

    let resp = client.get("/api/products/featured").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        slugs(&resp.body),
        vec![
            "modern-ceramic-vase",
            "minimalist-table-lamp",
            "handwoven-throw-blanket",
            "stone-coaster-set",
        ]
    );
    assert_eq!(resp.body[1]["price_display"], "R1,299.00");
}

#[tokio::test]
async fn test_products_filtered_by_category() {
    let ctx = TestContext::new();
    let mut client = ctx.client();

    let resp = client.get("/api/categories").await;
    assert_eq!(
        slugs(&resp.body),
        vec!["decor", "lighting", "table", "textiles"]
    );
    let lighting = resp.body[1]["id"].as_str().unwrap().to_string();

    let resp = client
        .get(&format!("/api/products?category={lighting}"))
        .await;
    assert_eq!(slugs(&resp.body), vec!["minimalist-table-lamp"]);

    let resp = client.get("/api/products").await;
    assert_eq!(resp.body.as_array().unwrap().len(), 4);

    let resp = client.get("/api/products?category=lamps").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_product_by_slug() {
    let ctx = TestContext::new();
    let mut client = ctx.client();

    let resp = client.get("/api/products/stone-coaster-set").await;
    assert_eq!(resp.body["name"], "Stone Coaster Set");
    assert_eq!(resp.body["price_display"], "R249.00");

    let resp = client.get("/api/products/no-such-thing").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, Value::Null);
}

#[tokio::test]
async fn test_journal_hides_drafts() {
    let ctx = TestContext::new();
    let mut client = ctx.client();

    let resp = client.get("/api/journal").await;
    assert_eq!(
        slugs(&resp.body),
        vec!["styling-small-spaces", "caring-for-natural-fibres"]
    );

    let resp = client.get("/api/journal/styling-small-spaces").await;
    assert_eq!(resp.body["title"], "Styling Small Spaces");

    let resp = client.get("/api/journal/autumn-collection-preview").await;
    assert_eq!(resp.body, Value::Null);
}

#[tokio::test]
async fn test_navigation_resolves_selectors() {
    let ctx = TestContext::new();
    let mut client = ctx.client();

    let resp = client
        .get("/api/navigation?page=product&param=modern-ceramic-vase")
        .await;
    assert_eq!(resp.body["page"], "product");
    assert_eq!(resp.body["param"], "modern-ceramic-vase");
    assert_eq!(resp.body["path"], "/products/modern-ceramic-vase");

    let resp = client.get("/api/navigation?page=journal").await;
    assert_eq!(resp.body["path"], "/journal");

    let resp = client.get("/api/navigation?page=wishlist").await;
    assert_eq!(resp.body["page"], "home");
    assert_eq!(resp.body["path"], "/");
}

#[tokio::test]
async fn test_unknown_route_is_json_not_found() {
    let ctx = TestContext::new();
    let mut client = ctx.client();

    let resp = client.get("/api/wishlist").await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body["error"].is_string());
}
