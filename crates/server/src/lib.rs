//! fhir-bundle-server library crate
//!
//! Exposes `build_app`, `AppState` and `config` for integration tests.
//! The binary entrypoint is in `main.rs`.

pub mod config;
mod error;
mod middleware;
mod routes;

use std::sync::Arc;

use axum::{Extension, Router, middleware as axum_mw, routing::get};
use chrono::{DateTime, Utc};
use fhir_bundle::Bundle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared read-only state: the bundle loaded at startup
#[derive(Clone)]
pub struct AppState {
    pub bundle: Arc<Bundle>,
    pub loaded_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(bundle: Bundle) -> Self {
        Self {
            bundle: Arc::new(bundle),
            loaded_at: Utc::now(),
        }
    }
}

/// Build the full application router with all routes and middleware.
///
/// Kept out of `main()` so integration tests can drive the router
/// without binding to a TCP port.
pub fn build_app(state: AppState, config: &Config) -> Router {
    // build_recorder() + set_global_recorder() lets repeated calls in tests
    // keep a valid handle; only the first install takes effect.
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let prometheus_handle = recorder.handle();
    let _ = metrics::set_global_recorder(recorder);

    metrics::gauge!("bundle_entries").set(state.bundle.len() as f64);

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any).allow_methods(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins).allow_methods(Any)
    };

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/metadata", get(routes::metadata::get))
        .route("/metrics", get(routes::metrics::get))
        .nest("/fhir", routes::fhir_routes())
        .layer(Extension(prometheus_handle))
        .with_state(state)
        .layer(axum_mw::from_fn(middleware::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum_mw::from_fn(middleware::metrics_middleware))
}
