//! fhir-bundle-server: read-only HTTP access to one FHIR Bundle.

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fhir_bundle::load_bundle_file;
use fhir_bundle_server::{AppState, config::Config};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let options = config.load_options();
    tracing::info!(
        path = %config.bundle_path.display(),
        extension_values = %options.extension_values,
        invalid_entries = %options.invalid_entries,
        "Loading bundle"
    );

    let bundle = match load_bundle_file(&config.bundle_path, &options) {
        Ok(bundle) => bundle,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load bundle");
            return ExitCode::FAILURE;
        }
    };

    let addr: SocketAddr = match config.bind_address.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, address = %config.bind_address, "Invalid bind address");
            return ExitCode::FAILURE;
        }
    };

    let app = fhir_bundle_server::build_app(AppState::new(bundle), &config);

    tracing::info!("Starting bundle server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Failed to bind {}", addr);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Server shutdown complete");
    ExitCode::SUCCESS
}

/// Resolve on SIGTERM or Ctrl+C
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
