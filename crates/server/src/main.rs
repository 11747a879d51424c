//! fhir-facade: FHIR REST interaction server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fhir_facade_server::codec::JsonCodec;
use fhir_facade_server::config::Config;
use fhir_facade_server::db::PgStore;
use fhir_facade_server::state::{AppState, Settings};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();

    // Create database pool
    let pool = fhir_facade_server::db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    let schema = fhir_facade_server::load_schema(&config).expect("Failed to load schema");
    let settings = Settings::from_config(&config);

    // Log startup info
    tracing::info!(
        known_resources = settings.known.len(),
        "Accepting {}",
        settings.known.listing()
    );
    if settings.multiple_delete {
        tracing::info!(
            max = settings.max_conditional_delete,
            "Conditional delete may remove multiple resources"
        );
    } else {
        tracing::info!("Conditional delete limited to a single match");
    }
    if config.schema_path.is_none() {
        tracing::warn!("SCHEMA_PATH not set, _summary=text keeps no mandatory elements");
    }

    let state = AppState::new(
        Arc::new(PgStore::new(pool)),
        Arc::new(JsonCodec),
        schema,
        settings,
    );

    // Build application
    let app = fhir_facade_server::build_app(state, &config);

    // Start server
    let addr: SocketAddr = config.bind_address.parse().expect("Invalid bind address");
    tracing::info!(%addr, "Serving FHIR REST interactions");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server shutdown complete");
}

/// Resolve on Ctrl+C, or SIGTERM on unix, so in-flight requests can drain
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let Ok(mut terminate) = signal(SignalKind::terminate()) else {
            tracing::warn!("SIGTERM handler unavailable, waiting for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!(signal = "SIGINT", "Shutting down"),
            _ = terminate.recv() => tracing::info!(signal = "SIGTERM", "Shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!(signal = "SIGINT", "Shutting down");
    }
}
