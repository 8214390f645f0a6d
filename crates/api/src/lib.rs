//! HTTP API server with observability for the order service.
//!
//! Exposes order placement and per-account order listing over JSON, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use orchestrator::{AccountService, CatalogService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, A, C>(state: Arc<AppState<S, A, C>>, metrics_handle: PrometheusHandle) -> Router
where
    S: OrderStore + 'static,
    A: AccountService + 'static,
    C: CatalogService + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S, A, C>))
        .route(
            "/accounts/{account_id}/orders",
            get(routes::orders::list_for_account::<S, A, C>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
