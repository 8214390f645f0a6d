//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use api::routes::orders::AppState;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use domain::{Account, Money, Product, ProductId};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::InMemoryOrderStore;
use orchestrator::{InMemoryAccountService, InMemoryCatalogService, OrderOrchestrator};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    store: InMemoryOrderStore,
    accounts: InMemoryAccountService,
    catalog: InMemoryCatalogService,
}

/// Account A1 exists; the catalog holds P1 at 10.00 and P2 at 5.00.
async fn setup() -> TestApp {
    let store = InMemoryOrderStore::new();
    let accounts = InMemoryAccountService::new();
    let catalog = InMemoryCatalogService::new();

    accounts.insert(Account::new("A1", "Ada")).await;
    catalog
        .upsert(Product::new("P1", "Widget", "A widget", Money::from_cents(1000)))
        .await;
    catalog
        .upsert(Product::new("P2", "Gadget", "A gadget", Money::from_cents(500)))
        .await;

    let state = Arc::new(AppState::new(
        OrderOrchestrator::new(store.clone(), accounts.clone(), catalog.clone()),
        Duration::from_secs(3),
        Duration::from_secs(10),
    ));
    let app = api::create_app(state, get_metrics_handle());

    TestApp {
        app,
        store,
        accounts,
        catalog,
    }
}

fn post_order(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let t = setup().await;

    let response = t.app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_order() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(post_order(serde_json::json!({
            "account_id": "A1",
            "products": [
                {"product_id": "P1", "quantity": 2},
                {"product_id": "P2", "quantity": 1}
            ]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await;
    assert_eq!(json["account_id"], "A1");
    assert_eq!(json["total_price"], 25.0);
    assert!(json["id"].as_str().is_some());
    assert!(json["created_at"].as_str().is_some());

    let products = json["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["product_id"], "P1");
    assert_eq!(products[0]["name"], "Widget");
    assert_eq!(products[0]["price"], 10.0);
    assert_eq!(products[0]["quantity"], 2);

    assert_eq!(t.store.order_count().await, 1);
}

#[tokio::test]
async fn test_create_then_list_shows_current_prices() {
    let t = setup().await;

    let created = t
        .app
        .clone()
        .oneshot(post_order(serde_json::json!({
            "account_id": "A1",
            "products": [
                {"product_id": "P1", "quantity": 2},
                {"product_id": "P2", "quantity": 1}
            ]
        })))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = json_body(created).await;

    t.catalog
        .set_price(&ProductId::new("P1"), Money::from_cents(1200))
        .await;

    let response = t.app.oneshot(get("/accounts/A1/orders")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let orders = json.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], created["id"]);
    assert_eq!(orders[0]["created_at"], created["created_at"]);
    assert_eq!(orders[0]["total_price"], 25.0);
    assert_eq!(orders[0]["products"][0]["price"], 12.0);
}

#[tokio::test]
async fn test_list_for_account_without_orders() {
    let t = setup().await;

    let response = t.app.oneshot(get("/accounts/A1/orders")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!([]));
    assert_eq!(t.catalog.call_count().await, 0);
}

#[tokio::test]
async fn test_unknown_account_is_not_found() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(post_order(serde_json::json!({
            "account_id": "nobody",
            "products": [{"product_id": "P1", "quantity": 1}]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["error"], "account_not_found");
    assert!(json["message"].as_str().unwrap().contains("nobody"));
}

#[tokio::test]
async fn test_invalid_quantity_is_bad_request() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(post_order(serde_json::json!({
            "account_id": "A1",
            "products": [{"product_id": "P1", "quantity": -3}]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_parameter");
    assert_eq!(t.accounts.call_count(), 0);
}

#[tokio::test]
async fn test_quantity_beyond_storable_range_is_bad_request() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(post_order(serde_json::json!({
            "account_id": "A1",
            "products": [{"product_id": "P1", "quantity": 2_147_483_648_i64}]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_parameter");
    assert_eq!(t.accounts.call_count(), 0);
    assert_eq!(t.store.order_count().await, 0);
}

#[tokio::test]
async fn test_unresolvable_products_is_unprocessable() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(post_order(serde_json::json!({
            "account_id": "A1",
            "products": [{"product_id": "P404", "quantity": 1}]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["error"], "empty_order");
    assert_eq!(t.store.order_count().await, 0);
}

#[tokio::test]
async fn test_catalog_outage_is_bad_gateway() {
    let t = setup().await;
    t.catalog.set_fail(true);

    let response = t
        .app
        .oneshot(post_order(serde_json::json!({
            "account_id": "A1",
            "products": [{"product_id": "P1", "quantity": 1}]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["error"], "products_unavailable");
}

#[tokio::test]
async fn test_short_deadline_header_times_out() {
    let t = setup().await;
    t.catalog.set_delay(Duration::from_millis(500));

    let mut request = post_order(serde_json::json!({
        "account_id": "A1",
        "products": [{"product_id": "P1", "quantity": 1}]
    }));
    request
        .headers_mut()
        .insert("x-request-timeout-ms", "20".parse().unwrap());

    let response = t.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json_body(response).await["error"], "timeout");
    assert_eq!(t.store.order_count().await, 0);
}

#[tokio::test]
async fn test_malformed_deadline_header() {
    let t = setup().await;

    let request = Request::builder()
        .uri("/accounts/A1/orders")
        .header("x-request-timeout-ms", "later")
        .body(Body::empty())
        .unwrap();

    let response = t.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_malformed_body() {
    let t = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json")
        .body(Body::from("{\"account_id\": 7"))
        .unwrap();

    let response = t.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_store_outage_on_list_is_unavailable() {
    let t = setup().await;
    t.store.set_fail_on_find(true);

    let response = t.app.oneshot(get("/accounts/A1/orders")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"], "order_lookup_failed");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup().await;

    let response = t.app.oneshot(get("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}
