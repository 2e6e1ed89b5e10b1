//! Allocation service binary.

use api::config::Config;
use product_store::InMemoryProductStore;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Resolves once SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for SIGINT");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal = received, "starting graceful shutdown");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Tracing, filtered by the configured directive
    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Prometheus recorder backing the /metrics endpoint
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Product store, message bus, and shared state
    let store = InMemoryProductStore::new();
    let (state, _notifications, _publisher) = api::create_default_state(store);

    // 4. Router
    let app = api::create_app(state, metrics_handle);

    // 5. Serve until a shutdown signal arrives
    let addr = config.addr();
    tracing::info!(%addr, "starting allocation API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listen address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server exited with error");

    tracing::info!("server stopped");
}
