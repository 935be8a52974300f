//! Main Entrypoint for the Interview API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing the model gateway and the shared session services.
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use interview_api::{config::Config, router::create_router, state::AppState};
use interview_core::{GeminiConfig, GeminiGateway};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl+C handler");
        return;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Shared Services ---
    let gateway = GeminiGateway::new(
        GeminiConfig::new(config.google_api_key.clone())
            .with_model(config.chat_model.clone())
            .with_base_url(config.api_base.clone())
            .with_timeout(config.upstream_timeout),
    )
    .context("Failed to build model gateway")?;

    let app_state = Arc::new(AppState::new(config.clone(), Arc::new(gateway)));

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        model = %config.chat_model,
        bind_address = %config.bind_address,
        history_window = config.history_window,
        session_id_fallback = ?config.session_id_fallback,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
