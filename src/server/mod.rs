//! HTTP routes for the bridge.
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | `/` | liveness text |
//! | GET | `/api/shopify/auth/start` | redirect to the authorize URL |
//! | GET | `/api/shopify/auth/callback` | code exchange, then persist downstream |
//! | POST | `/api/shopify/webhooks/orders/create` | verify and forward an order webhook |
//! | POST | `/api/shopify/webhooks` | verify and forward any webhook |
//! | POST | `/api/shopify/discounts/create` | create a price rule and discount code |
//! | GET, POST | `/api/ping` | downstream connectivity check |
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_bridge::server::{router, AppState};
//!
//! let state = AppState::new(config)?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router(state)).await?;
//! ```

mod error;
mod handlers;

pub use error::ApiError;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::auth::oauth::{InMemoryStateStore, StateStore};
use crate::clients::build_reqwest_client;
use crate::config::BridgeConfig;
use crate::downstream::{DownstreamClient, DownstreamError};
use crate::webhooks::WebhookVerifier;

/// Path of the OAuth callback route.
pub const CALLBACK_ROUTE: &str = "/api/shopify/auth/callback";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration.
    pub config: Arc<BridgeConfig>,
    /// Outbound HTTP client shared by every request to Shopify and the store.
    pub http: reqwest::Client,
    /// Consumed state nonces.
    pub state_store: Arc<dyn StateStore>,
    /// Verifier for the configured webhook secret.
    pub verifier: WebhookVerifier,
    /// The downstream store, if configured.
    pub downstream: Option<Arc<DownstreamClient>>,
}

impl AppState {
    /// Builds the state from configuration, with an in-memory state store.
    ///
    /// # Errors
    ///
    /// Returns [`DownstreamError::Client`] if the HTTP client cannot be built.
    pub fn new(config: BridgeConfig) -> Result<Self, DownstreamError> {
        let http =
            build_reqwest_client(&config).map_err(|e| DownstreamError::Client(e.to_string()))?;
        let downstream = config
            .downstream()
            .map(|downstream| Arc::new(DownstreamClient::new(downstream.clone(), http.clone())));
        Ok(Self {
            verifier: WebhookVerifier::from_config(&config),
            config: Arc::new(config),
            http,
            state_store: Arc::new(InMemoryStateStore::new()),
            downstream,
        })
    }

    /// Replaces the state store.
    #[must_use]
    pub fn with_state_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.state_store = store;
        self
    }
}

/// Builds the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/shopify/auth/start", get(handlers::auth_start))
        .route(CALLBACK_ROUTE, get(handlers::auth_callback))
        .route(
            "/api/shopify/webhooks/orders/create",
            post(handlers::orders_create_webhook),
        )
        .route("/api/shopify/webhooks", post(handlers::webhook))
        .route(
            "/api/shopify/discounts/create",
            post(handlers::create_discount),
        )
        .route("/api/ping", get(handlers::ping).post(handlers::ping))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, DownstreamConfig};

    #[test]
    fn test_app_state_builds_downstream_on_shared_client() {
        let config = BridgeConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .downstream(
                DownstreamConfig::new(ApiSecretKey::new("ds-key").unwrap())
                    .ping_url("http://127.0.0.1:9/ping"),
            )
            .build()
            .unwrap();

        let state = AppState::new(config).unwrap();
        let downstream = state.downstream.unwrap();
        assert_eq!(
            downstream.config().ping_url_value(),
            Some("http://127.0.0.1:9/ping")
        );
    }

    #[test]
    fn test_app_state_without_downstream() {
        let config = BridgeConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .build()
            .unwrap();

        assert!(AppState::new(config).unwrap().downstream.is_none());
    }
}
