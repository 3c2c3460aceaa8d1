//! # shopify-bridge
//!
//! Connects Shopify shops to an external application backend: merchants
//! install through the OAuth authorization code flow, and the shop's signed
//! webhooks are verified and forwarded.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`BridgeConfig`] and [`BridgeConfigBuilder`]
//! - Validated newtypes for API credentials and domain values
//! - OAuth scope handling with implied scope support
//! - The OAuth authorization code flow with signed, single-use state via [`auth::oauth`]
//! - Webhook HMAC-SHA256 verification over the raw body via [`webhooks`]
//! - A client for the downstream store that keeps shop connections via [`downstream`]
//! - Affiliate discount creation through the Admin API via [`discounts`]
//! - The axum routes tying it together via [`server`]
//!
//! ## Quick Start
//!
//! ```rust
//! use shopify_bridge::{BridgeConfig, ApiKey, ApiSecretKey, ApiVersion, HostUrl};
//!
//! let config = BridgeConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .scopes("read_orders,write_discounts".parse().unwrap())
//!     .host(HostUrl::new("https://bridge.example.com").unwrap())
//!     .api_version(ApiVersion::DEFAULT)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.callback_path(), "/callback");
//! ```
//!
//! ## OAuth Authorization
//!
//! ```rust,ignore
//! use shopify_bridge::auth::oauth::{
//!     begin_auth_with_config_defaults, complete_callback, CallbackQuery, InMemoryStateStore,
//! };
//!
//! // Step 1: Redirect the merchant
//! let result = begin_auth_with_config_defaults(&config, "my-store.myshopify.com", "brand-1")?;
//! // Respond with a redirect to result.auth_url
//!
//! // Step 2: Handle the callback
//! let store = InMemoryStateStore::new();
//! let credential = complete_callback(&config, &query, &store).await?;
//! println!("Connected {} with {}", credential.shop, credential.scopes);
//! ```
//!
//! ## Webhook Verification
//!
//! ```rust
//! use shopify_bridge::auth::oauth::hmac::compute_signature_base64;
//! use shopify_bridge::webhooks::{WebhookEnvelope, WebhookError, WebhookVerifier};
//!
//! let verifier = WebhookVerifier::from_raw("shared-secret").unwrap();
//! let body = br#"{"id":1}"#.to_vec();
//! let signature = compute_signature_base64(&body, b"shared-secret");
//!
//! let envelope = WebhookEnvelope::new(
//!     body,
//!     Some(signature),
//!     Some("orders/create".to_string()),
//!     Some("my-store.myshopify.com".to_string()),
//!     None,
//!     None,
//! );
//! let webhook = verifier.verify(&envelope).unwrap();
//! assert_eq!(webhook.payload()["id"], 1);
//!
//! let forged = WebhookEnvelope::new(b"{}".to_vec(), Some("AAAA".to_string()), None, None, None, None);
//! assert_eq!(verifier.verify(&forged), Err(WebhookError::InvalidSignature));
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration is loaded once and passed explicitly
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Raw bytes only**: Webhook signatures are checked before any parsing
//! - **Thread-safe**: All types are `Send + Sync`
//! - **No retries**: Authorization codes and resource creation are not safe to repeat

pub mod auth;
pub mod clients;
pub mod config;
pub mod discounts;
pub mod downstream;
pub mod error;
pub mod server;
pub mod webhooks;

// Re-export public types at crate root for convenience
pub use auth::{AccessCredential, AccessToken, AuthScopes};
pub use config::{
    ApiKey, ApiSecretKey, ApiVersion, BridgeConfig, BridgeConfigBuilder, DownstreamConfig,
    HostUrl, ShopDomain,
};
pub use error::ConfigError;

// Re-export OAuth types for convenience
pub use auth::oauth::{
    begin_auth, begin_auth_with_config_defaults, complete_callback, BeginAuthResult,
    CallbackQuery, OAuthError,
};

// Re-export webhook types for convenience
pub use webhooks::{VerifiedWebhook, WebhookEnvelope, WebhookError, WebhookVerifier};
