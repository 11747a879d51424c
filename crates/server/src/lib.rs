//! fhir-facade-server library crate
//!
//! Exposes `build_app`, the store/codec seams and `config` for integration
//! tests. The actual binary entrypoint is in `main.rs`.

pub mod codec;
pub mod config;
pub mod db;
pub mod error;
mod middleware;
pub mod rest;
mod routes;
pub mod state;

use std::sync::Arc;

use axum::{Extension, Router, middleware as axum_mw, routing::get};
use fhir_facade_core::{ElementTable, SchemaLookup};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use state::AppState;

/// Build the full application router with all routes and middleware.
///
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a TCP port.
pub fn build_app(state: AppState, config: &Config) -> Router {
    // Install Prometheus metrics recorder.
    // Use build_recorder() + set_global_recorder() so that repeated calls
    // (e.g. in integration tests) don't panic; the second install is
    // silently ignored and we still get a valid handle for /metrics.
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let prometheus_handle = recorder.handle();
    let _ = metrics::set_global_recorder(recorder);

    // Operational routes
    let ops_routes = Router::new()
        .route("/health", get(routes::health::check))
        .route("/metrics", get(middleware::metrics::render))
        .layer(Extension(prometheus_handle));

    // Build CORS layer
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Build application
    Router::new()
        .merge(ops_routes)
        .merge(routes::fhir_routes())
        .route_layer(axum_mw::from_fn(middleware::metrics_middleware))
        .with_state(state)
        .layer(axum_mw::from_fn(middleware::audit_middleware))
        .layer(axum_mw::from_fn(middleware::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Element definitions for `_summary=text`, from `SCHEMA_PATH` when set
pub fn load_schema(config: &Config) -> Result<Arc<dyn SchemaLookup>, String> {
    let Some(path) = config.schema_path.as_deref() else {
        return Ok(Arc::new(ElementTable::default()));
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read schema file {}: {}", path, e))?;
    let table = ElementTable::from_json(&raw).map_err(|e| e.to_string())?;
    Ok(Arc::new(table))
}
