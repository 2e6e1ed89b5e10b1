//! HTTP API for the allocation service.
//!
//! Exposes batch registration and order-line allocation over REST.
//! Requests are traced per route and counted into Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use messagebus::{InMemoryNotifications, InMemoryPublisher, MessageBus};
use metrics_exporter_prometheus::PrometheusHandle;
use product_store::ProductStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::allocations::AppState;

/// Builds the router: service routes over `state`, a `/metrics` route
/// over the Prometheus handle, permissive CORS, and request tracing.
pub fn create_app<S: ProductStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/batches", post(routes::allocations::add_batch::<S>))
        .route("/allocations", post(routes::allocations::allocate::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a store, wired with in-memory
/// notification and publisher collaborators. Both collaborators are
/// returned alongside the state so callers can inspect them.
pub fn create_default_state<S: ProductStore + 'static>(
    store: S,
) -> (Arc<AppState<S>>, InMemoryNotifications, InMemoryPublisher) {
    let notifications = InMemoryNotifications::new();
    let publisher = InMemoryPublisher::new();
    let bus = MessageBus::new(
        store,
        Arc::new(notifications.clone()),
        Arc::new(publisher.clone()),
    );
    let state = Arc::new(AppState { bus });
    (state, notifications, publisher)
}
