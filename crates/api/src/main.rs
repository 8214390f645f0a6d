//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use api::routes::orders::AppState;
use order_store::{OrderStore, PostgresOrderStore, RetryPolicy, retry};
use orchestrator::{HttpAccountService, HttpCatalogService, OrderOrchestrator};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Connect to the order store; the service does not start without it
    let retry_policy = RetryPolicy::fixed(config.db_retry_delay);
    let store = retry(&retry_policy, "connect to order store", || {
        PostgresOrderStore::connect(&config.database_url, config.db_max_connections)
    })
    .await?;
    tracing::info!(max_connections = config.db_max_connections, "order store ready");

    // 4. Collaborator clients and application state
    let accounts = HttpAccountService::new(&config.account_service_url)?;
    let catalog = HttpCatalogService::new(&config.catalog_service_url)?;
    let state = Arc::new(AppState::new(
        OrderOrchestrator::new(store, accounts, catalog),
        config.request_timeout,
        config.max_request_timeout,
    ));

    // 5. Build the application
    let app = api::create_app(state.clone(), metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(
        %addr,
        account_service = %config.account_service_url,
        catalog_service = %config.catalog_service_url,
        request_timeout_ms = config.request_timeout.as_millis() as u64,
        "starting API server"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // 7. Release the pool whether or not the server exited cleanly
    state.orchestrator.store().close().await;
    served?;

    tracing::info!("server shut down gracefully");
    Ok(())
}
