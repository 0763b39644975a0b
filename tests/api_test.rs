//! Router-level tests: the full axum app over the in-memory favorites store
//! and a scripted catalog provider.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use parking_lot::Mutex;
use tower::ServiceExt;

use stock_catalog_backend::app::create_app;
use stock_catalog_backend::external::catalog_provider::{CatalogProvider, CatalogProviderError};
use stock_catalog_backend::models::Stock;
use stock_catalog_backend::services::catalog_service::{CatalogService, CatalogServiceOptions};
use stock_catalog_backend::state::AppState;
use stock_catalog_backend::store::favorites::InMemoryFavoritesStore;

const APPLE_JSON: &str = r#"{"id":1,"logo":"","name":"Apple","symbol":"AAPL","price":190.5,"change":-1.2,"changePercent":-0.6}"#;

struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<Vec<Stock>, CatalogProviderError>>>,
}

#[async_trait]
impl CatalogProvider for ScriptedProvider {
    async fn fetch_catalog(&self) -> Result<Vec<Stock>, CatalogProviderError> {
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(CatalogProviderError::Network("script exhausted".into())))
    }
}

fn catalog() -> Vec<Stock> {
    let apple: Stock = serde_json::from_str(APPLE_JSON).unwrap();
    let mut msft = apple.clone();
    msft.id = 2;
    msft.name = "Microsoft".to_string();
    msft.symbol = "MSFT".to_string();
    msft.change = 2.5;
    msft.change_percent = 0.7;
    vec![apple, msft]
}

fn app_with(responses: Vec<Result<Vec<Stock>, CatalogProviderError>>) -> Router {
    let provider = Arc::new(ScriptedProvider {
        responses: Mutex::new(responses.into()),
    });
    let service = CatalogService::new(
        provider,
        Arc::new(InMemoryFavoritesStore::new()),
        CatalogServiceOptions::default(),
    );
    create_app(AppState {
        catalog: Arc::new(service),
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app_with(vec![]);
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_readiness_reports_catalog_state() {
    let app = app_with(vec![Ok(catalog())]);

    let (status, body) = send(&app, get("/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["catalog_state"], "idle");

    send(&app, get("/api/stocks")).await;

    let (_, body) = send(&app, get("/health/ready")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ready");
    assert_eq!(json["catalog_loaded"], true);
}

#[tokio::test]
async fn test_annotated_catalog_flags_favorites() {
    let app = app_with(vec![Ok(catalog())]);
    let (status, _) = send(&app, post_json("/api/favorites", APPLE_JSON)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, get("/api/stocks/annotated")).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json[0]["symbol"], "AAPL");
    assert_eq!(json[0]["is_favorite"], true);
    assert_eq!(json[0]["changePercent"], -0.6);
    assert_eq!(json[1]["symbol"], "MSFT");
    assert_eq!(json[1]["is_favorite"], false);
}

#[tokio::test]
async fn test_fetch_catalog_returns_upstream_field_names() {
    let app = app_with(vec![Ok(catalog())]);

    let (status, body) = send(&app, get("/api/stocks")).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[0]["symbol"], "AAPL");
    assert_eq!(json[0]["changePercent"], -0.6);
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let app = app_with(vec![Err(CatalogProviderError::Status(500))]);

    let (status, _) = send(&app, get("/api/stocks")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, body) = send(&app, get("/api/stocks/state")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["state"], "fetch_failed");
    assert_eq!(json["stock_count"], 0);
}

#[tokio::test]
async fn test_search_over_snapshot() {
    let app = app_with(vec![Ok(catalog())]);

    let (status, body) = send(&app, get("/api/stocks/search?q=micro")).await;
    assert_eq!(status, StatusCode::OK);
    let results: Vec<Stock> = serde_json::from_slice(&body).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].symbol, "MSFT");

    // Empty query: nothing, and no second fetch needed.
    let (status, body) = send(&app, get("/api/stocks/search?q=")).await;
    assert_eq!(status, StatusCode::OK);
    let results: Vec<Stock> = serde_json::from_slice(&body).unwrap();
    assert!(results.is_empty());

    let (_, body) = send(&app, get("/api/stocks/state")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["state"], "loaded");
    assert_eq!(json["stock_count"], 2);
}

#[tokio::test]
async fn test_favorites_lifecycle() {
    let app = app_with(vec![]);

    let (status, _) = send(&app, post_json("/api/favorites", APPLE_JSON)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, post_json("/api/favorites", APPLE_JSON)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, get("/api/favorites")).await;
    let favorites: Vec<Stock> = serde_json::from_slice(&body).unwrap();
    assert_eq!(favorites.len(), 1);

    let (_, body) = send(&app, get("/api/favorites/AAPL")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["is_favorite"], true);

    let (status, _) = send(&app, delete("/api/favorites/AAPL")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, delete("/api/favorites/AAPL")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, get("/api/favorites/AAPL")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["is_favorite"], false);
}

#[tokio::test]
async fn test_add_favorite_rejects_blank_symbol() {
    let app = app_with(vec![]);
    let blank = APPLE_JSON.replace("\"AAPL\"", "\"  \"");

    let (status, _) = send(&app, post_json("/api/favorites", &blank)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_favorite_rejects_incomplete_stock() {
    let app = app_with(vec![]);

    let (status, _) = send(&app, post_json("/api/favorites", r#"{"symbol":"AAPL"}"#)).await;
    assert!(status.is_client_error());
}
