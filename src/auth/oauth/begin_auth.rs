//! OAuth authorization URL generation.
//!
//! [`begin_auth`] is the first step of the authorization code flow. It mints
//! a signed [`StateToken`] and builds the URL the merchant is redirected to.
//! No network call is made.
//!
//! # Example
//!
//! ```rust
//! use shopify_bridge::{ApiKey, ApiSecretKey, BridgeConfig, HostUrl};
//! use shopify_bridge::auth::oauth::begin_auth;
//!
//! let config = BridgeConfig::builder()
//!     .api_key(ApiKey::new("api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let redirect_base = HostUrl::new("https://api.example.com").unwrap();
//! let scopes = "read_orders".parse().unwrap();
//! let result = begin_auth(&config, "test-shop", "brand-1", &scopes, &redirect_base).unwrap();
//!
//! assert!(result
//!     .auth_url
//!     .starts_with("https://test-shop.myshopify.com/admin/oauth/authorize?client_id=api-key&scope=read_orders"));
//! ```

use chrono::Utc;

use crate::auth::oauth::error::OAuthError;
use crate::auth::oauth::state::StateToken;
use crate::auth::AuthScopes;
use crate::config::{BridgeConfig, HostUrl, ShopDomain};

/// Result of initiating OAuth authorization.
#[derive(Clone, Debug)]
pub struct BeginAuthResult {
    /// The full authorization URL to redirect the merchant to.
    pub auth_url: String,

    /// The validated shop the URL points at.
    pub shop: ShopDomain,

    /// The state token embedded in `auth_url`.
    ///
    /// The token is self-verifying, so nothing has to be stored to check it
    /// on the callback.
    pub state: StateToken,
}

/// Builds the authorization redirect for `shop`.
///
/// # Arguments
///
/// * `config` - Bridge configuration (client id and secret)
/// * `shop` - Raw shop value from the request; validated against the configured suffix
/// * `correlation_id` - Opaque id (brand id) carried through the flow in the state
/// * `scopes` - Scopes to request, comma-joined in the URL
/// * `redirect_base` - Public base URL; `config.callback_path()` is appended to it
///
/// # Errors
///
/// - [`OAuthError::InvalidShopDomain`] if `shop` is not a host under the platform suffix
/// - [`OAuthError::MissingParameter`] if `correlation_id` is empty
pub fn begin_auth(
    config: &BridgeConfig,
    shop: &str,
    correlation_id: &str,
    scopes: &AuthScopes,
    redirect_base: &HostUrl,
) -> Result<BeginAuthResult, OAuthError> {
    let shop = config.parse_shop(shop)?;

    let correlation_id = correlation_id.trim();
    if correlation_id.is_empty() {
        return Err(OAuthError::MissingParameter { name: "brandId" });
    }

    let state = StateToken::mint(config.api_secret_key(), correlation_id, &shop, Utc::now());
    let redirect_uri = redirect_base.join(config.callback_path());

    let params = [
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", scopes.to_string()),
        ("redirect_uri", redirect_uri),
        ("state", state.to_string()),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let auth_url = format!(
        "https://{}/admin/oauth/authorize?{}",
        shop.as_ref(),
        query_string
    );

    tracing::debug!(shop = %shop, correlation_id, "built authorization redirect");

    Ok(BeginAuthResult {
        auth_url,
        shop,
        state,
    })
}

/// Builds the authorization redirect using the configured scopes and host.
///
/// # Errors
///
/// Returns [`OAuthError::Misconfigured`] if no public host is configured, and
/// otherwise the same errors as [`begin_auth`].
pub fn begin_auth_with_config_defaults(
    config: &BridgeConfig,
    shop: &str,
    correlation_id: &str,
) -> Result<BeginAuthResult, OAuthError> {
    let host = config.host().ok_or_else(|| OAuthError::Misconfigured {
        reason: "backend host URL is not configured".to_string(),
    })?;
    begin_auth(config, shop, correlation_id, config.scopes(), host)
}

// Verify BeginAuthResult is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BeginAuthResult>();
};
