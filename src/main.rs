//! shopify-bridge server binary.
//!
//! Loads `.env`, initializes logging, validates configuration and serves the
//! routes of [`shopify_bridge::server`] until Ctrl-C.

use shopify_bridge::server::{router, AppState};
use shopify_bridge::BridgeConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match BridgeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    info!(
        api_version = %config.api_version(),
        host = config.host().map_or("<unset>", |h| h.origin()),
        downstream = config.downstream().is_some(),
        "configuration loaded"
    );

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to initialize downstream client");
            std::process::exit(1);
        }
    };

    let addr = std::env::var("BIND_ADDRESS")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, address = %addr, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(address = %addr, "shopify-bridge listening");

    if let Err(e) = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "server error");
        std::process::exit(1);
    }

    info!("shopify-bridge stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}
