//! Configuration types for the bridge.
//!
//! Configuration is built once at process start, validated, and then shared
//! read-only (typically behind an `Arc`) by every request handler. Nothing in
//! the OAuth or webhook code reads the process environment directly.
//!
//! # Overview
//!
//! - [`BridgeConfig`]: The immutable configuration
//! - [`BridgeConfigBuilder`]: A builder for constructing [`BridgeConfig`] instances
//! - [`DownstreamConfig`]: Endpoints of the external store the bridge reports to
//! - [`ApiKey`], [`ApiSecretKey`], [`ShopDomain`], [`HostUrl`], [`ApiVersion`]: validated values
//!
//! # Example
//!
//! ```rust
//! use shopify_bridge::{BridgeConfig, ApiKey, ApiSecretKey, HostUrl};
//!
//! let config = BridgeConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .host(HostUrl::new("https://api.example.com").unwrap())
//!     .scopes("read_orders".parse().unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.callback_path(), "/callback");
//! ```

mod newtypes;
mod version;

pub use newtypes::{ApiKey, ApiSecretKey, HostUrl, ShopDomain};
pub use version::ApiVersion;

use std::time::Duration;

use crate::auth::AuthScopes;
use crate::error::ConfigError;

/// Endpoints and credentials of the downstream store.
///
/// Every URL is optional; operations whose URL is missing are skipped (or
/// refused, for routes that cannot work without them).
#[derive(Clone, Debug)]
pub struct DownstreamConfig {
    api_key: ApiSecretKey,
    save_connection_url: Option<String>,
    webhook_url: Option<String>,
    store_lookup_url: Option<String>,
    ping_url: Option<String>,
}

impl DownstreamConfig {
    /// Creates a downstream configuration with no endpoints.
    #[must_use]
    pub const fn new(api_key: ApiSecretKey) -> Self {
        Self {
            api_key,
            save_connection_url: None,
            webhook_url: None,
            store_lookup_url: None,
            ping_url: None,
        }
    }

    /// Sets the URL that receives newly minted shop credentials.
    #[must_use]
    pub fn save_connection_url(mut self, url: impl Into<String>) -> Self {
        self.save_connection_url = Some(url.into());
        self
    }

    /// Sets the URL that receives verified webhooks.
    #[must_use]
    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Sets the URL used to look up a brand's connected store.
    #[must_use]
    pub fn store_lookup_url(mut self, url: impl Into<String>) -> Self {
        self.store_lookup_url = Some(url.into());
        self
    }

    /// Sets the connectivity check URL.
    #[must_use]
    pub fn ping_url(mut self, url: impl Into<String>) -> Self {
        self.ping_url = Some(url.into());
        self
    }

    /// Returns the value sent in the `x-api-key` header.
    #[must_use]
    pub const fn api_key(&self) -> &ApiSecretKey {
        &self.api_key
    }

    /// Returns the credential persistence URL, if configured.
    #[must_use]
    pub fn save_connection_url_value(&self) -> Option<&str> {
        self.save_connection_url.as_deref()
    }

    /// Returns the webhook forwarding URL, if configured.
    #[must_use]
    pub fn webhook_url_value(&self) -> Option<&str> {
        self.webhook_url.as_deref()
    }

    /// Returns the store lookup URL, if configured.
    #[must_use]
    pub fn store_lookup_url_value(&self) -> Option<&str> {
        self.store_lookup_url.as_deref()
    }

    /// Returns the ping URL, if configured.
    #[must_use]
    pub fn ping_url_value(&self) -> Option<&str> {
        self.ping_url.as_deref()
    }
}

/// Immutable configuration for the bridge.
///
/// # Thread Safety
///
/// `BridgeConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads and async tasks.
///
/// # Secrets
///
/// The OAuth client secret signs state tokens and authenticates the token
/// exchange. The webhook secret verifies webhook deliveries and defaults to
/// the client secret, which is what Shopify signs app webhooks with. Exactly
/// one webhook secret is ever tried.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    webhook_secret: Option<ApiSecretKey>,
    scopes: AuthScopes,
    host: Option<HostUrl>,
    callback_path: String,
    shop_domain_suffix: String,
    api_host: Option<HostUrl>,
    api_version: ApiVersion,
    state_ttl: chrono::Duration,
    http_timeout: Duration,
    downstream: Option<DownstreamConfig>,
    user_agent_prefix: Option<String>,
}

impl BridgeConfig {
    /// Default path appended to the redirect base URL.
    pub const DEFAULT_CALLBACK_PATH: &'static str = "/callback";

    /// Default lifetime of a minted state token, in seconds.
    pub const DEFAULT_STATE_TTL_SECS: i64 = 600;

    /// Longest accepted state token lifetime, in seconds (one day).
    pub const MAX_STATE_TTL_SECS: i64 = 86_400;

    /// Default timeout for every outbound HTTP call, in seconds.
    pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

    /// Creates a new builder for constructing a `BridgeConfig`.
    #[must_use]
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::new()
    }

    /// Loads configuration from the process environment.
    ///
    /// See [`BridgeConfig::from_lookup`] for the variables read.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a required variable is missing or any
    /// value fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as absent. Secrets are taken verbatim.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `SHOPIFY_API_KEY` | OAuth client id (required) |
    /// | `SHOPIFY_API_SECRET` | OAuth client secret (required) |
    /// | `SHOPIFY_WEBHOOK_SECRET` | Webhook signing secret (defaults to the client secret) |
    /// | `SHOPIFY_SCOPES` | Comma-separated scopes |
    /// | `BACKEND_URL` | Public base URL of this service |
    /// | `SHOPIFY_CALLBACK_PATH` | Callback path (default `/api/shopify/auth/callback`) |
    /// | `SHOPIFY_SHOP_DOMAIN_SUFFIX` | Platform domain suffix |
    /// | `SHOPIFY_API_HOST` | Origin override for outbound shop calls |
    /// | `SHOPIFY_API_VERSION` | Admin API version |
    /// | `SHOPIFY_STATE_TTL_SECS` | State token lifetime |
    /// | `HTTP_TIMEOUT_SECS` | Outbound HTTP timeout |
    /// | `USER_AGENT_PREFIX` | Prefix for the outbound `User-Agent` |
    /// | `DOWNSTREAM_API_KEY` | Enables the downstream store client |
    /// | `DOWNSTREAM_SAVE_CONNECTION_URL`, `DOWNSTREAM_WEBHOOK_URL`, `DOWNSTREAM_STORE_LOOKUP_URL`, `DOWNSTREAM_PING_URL` | Downstream endpoints |
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a required variable is missing or any
    /// value fails validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::MissingEnvVar { name });

        let mut builder = Self::builder()
            .api_key(ApiKey::new(require("SHOPIFY_API_KEY")?)?)
            .api_secret_key(ApiSecretKey::new(require("SHOPIFY_API_SECRET")?)?)
            .callback_path(
                get("SHOPIFY_CALLBACK_PATH")
                    .unwrap_or_else(|| "/api/shopify/auth/callback".to_string()),
            );

        if let Some(secret) = get("SHOPIFY_WEBHOOK_SECRET") {
            builder = builder.webhook_secret(ApiSecretKey::new(secret)?);
        }
        if let Some(scopes) = get("SHOPIFY_SCOPES") {
            builder = builder.scopes(AuthScopes::requested(&scopes)?);
        }
        if let Some(host) = get("BACKEND_URL") {
            builder = builder.host(HostUrl::new(host)?);
        }
        if let Some(suffix) = get("SHOPIFY_SHOP_DOMAIN_SUFFIX") {
            builder = builder.shop_domain_suffix(suffix);
        }
        if let Some(api_host) = get("SHOPIFY_API_HOST") {
            builder = builder.api_host(HostUrl::new(api_host)?);
        }
        if let Some(version) = get("SHOPIFY_API_VERSION") {
            builder = builder.api_version(version.parse()?);
        }
        if let Some(ttl) = get("SHOPIFY_STATE_TTL_SECS") {
            let secs = parse_secs("SHOPIFY_STATE_TTL_SECS", &ttl)?;
            let ttl = i64::try_from(secs)
                .ok()
                .and_then(chrono::Duration::try_seconds)
                .ok_or_else(|| ConfigError::InvalidEnvVar {
                    name: "SHOPIFY_STATE_TTL_SECS",
                    reason: format!("{secs} seconds is out of range"),
                })?;
            builder = builder.state_ttl(ttl);
        }
        if let Some(timeout) = get("HTTP_TIMEOUT_SECS") {
            let secs = parse_secs("HTTP_TIMEOUT_SECS", &timeout)?;
            builder = builder.http_timeout(Duration::from_secs(secs));
        }
        if let Some(prefix) = get("USER_AGENT_PREFIX") {
            builder = builder.user_agent_prefix(prefix);
        }

        if let Some(api_key) = get("DOWNSTREAM_API_KEY") {
            let mut downstream = DownstreamConfig::new(ApiSecretKey::new(api_key)?);
            if let Some(url) = get("DOWNSTREAM_SAVE_CONNECTION_URL") {
                downstream = downstream.save_connection_url(url);
            }
            if let Some(url) = get("DOWNSTREAM_WEBHOOK_URL") {
                downstream = downstream.webhook_url(url);
            }
            if let Some(url) = get("DOWNSTREAM_STORE_LOOKUP_URL") {
                downstream = downstream.store_lookup_url(url);
            }
            if let Some(url) = get("DOWNSTREAM_PING_URL") {
                downstream = downstream.ping_url(url);
            }
            builder = builder.downstream(downstream);
        }

        builder.build()
    }

    /// Returns the API key (OAuth `client_id`).
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the API secret key (OAuth `client_secret`).
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the single secret webhook signatures are verified against.
    #[must_use]
    pub fn webhook_secret(&self) -> &ApiSecretKey {
        self.webhook_secret.as_ref().unwrap_or(&self.api_secret_key)
    }

    /// Returns the default OAuth scopes.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the public base URL of this service, if configured.
    #[must_use]
    pub const fn host(&self) -> Option<&HostUrl> {
        self.host.as_ref()
    }

    /// Returns the path appended to the redirect base to form `redirect_uri`.
    #[must_use]
    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    /// Returns the platform domain suffix shops must belong to.
    #[must_use]
    pub fn shop_domain_suffix(&self) -> &str {
        &self.shop_domain_suffix
    }

    /// Returns the outbound origin override, if configured.
    #[must_use]
    pub const fn api_host(&self) -> Option<&HostUrl> {
        self.api_host.as_ref()
    }

    /// Returns the Admin API version.
    #[must_use]
    pub const fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// Returns how long a minted state token stays valid.
    #[must_use]
    pub const fn state_ttl(&self) -> chrono::Duration {
        self.state_ttl
    }

    /// Returns the timeout applied to every outbound HTTP call.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    /// Returns the downstream store configuration, if any.
    #[must_use]
    pub const fn downstream(&self) -> Option<&DownstreamConfig> {
        self.downstream.as_ref()
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Validates a raw shop value against the configured platform suffix.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the value is not a shop
    /// under [`BridgeConfig::shop_domain_suffix`].
    pub fn parse_shop(&self, raw: &str) -> Result<ShopDomain, ConfigError> {
        ShopDomain::parse(raw, &self.shop_domain_suffix)
    }

    /// Returns the origin outbound calls for `shop` are sent to.
    ///
    /// This is `https://{shop}` unless an API host override is configured.
    #[must_use]
    pub fn shop_origin(&self, shop: &ShopDomain) -> String {
        self.api_host.as_ref().map_or_else(
            || format!("https://{}", shop.as_ref()),
            |host| host.origin().to_string(),
        )
    }
}

fn parse_secs(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            name,
            reason: e.to_string(),
        })
}

// Verify BridgeConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BridgeConfig>();
};

/// Builder for constructing [`BridgeConfig`] instances.
///
/// Required fields are `api_key` and `api_secret_key`.
///
/// # Defaults
///
/// - `webhook_secret`: the API secret key
/// - `scopes`: Empty
/// - `host`, `api_host`, `downstream`, `user_agent_prefix`: `None`
/// - `callback_path`: `/callback`
/// - `shop_domain_suffix`: `myshopify.com`
/// - `api_version`: `2024-01`
/// - `state_ttl`: 10 minutes
/// - `http_timeout`: 10 seconds
#[derive(Debug, Default)]
pub struct BridgeConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    webhook_secret: Option<ApiSecretKey>,
    scopes: Option<AuthScopes>,
    host: Option<HostUrl>,
    callback_path: Option<String>,
    shop_domain_suffix: Option<String>,
    api_host: Option<HostUrl>,
    api_version: Option<ApiVersion>,
    state_ttl: Option<chrono::Duration>,
    http_timeout: Option<Duration>,
    downstream: Option<DownstreamConfig>,
    user_agent_prefix: Option<String>,
}

impl BridgeConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets a dedicated webhook signing secret.
    #[must_use]
    pub fn webhook_secret(mut self, key: ApiSecretKey) -> Self {
        self.webhook_secret = Some(key);
        self
    }

    /// Sets the default OAuth scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the public base URL of this service.
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the callback path appended to the redirect base.
    #[must_use]
    pub fn callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = Some(path.into());
        self
    }

    /// Sets the platform domain suffix shops must belong to.
    #[must_use]
    pub fn shop_domain_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.shop_domain_suffix = Some(suffix.into());
        self
    }

    /// Routes outbound shop calls to this origin instead of `https://{shop}`.
    #[must_use]
    pub fn api_host(mut self, host: HostUrl) -> Self {
        self.api_host = Some(host);
        self
    }

    /// Sets the Admin API version.
    #[must_use]
    pub const fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Sets the lifetime of minted state tokens.
    #[must_use]
    pub const fn state_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.state_ttl = Some(ttl);
        self
    }

    /// Sets the timeout for outbound HTTP calls.
    #[must_use]
    pub const fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Sets the downstream store configuration.
    #[must_use]
    pub fn downstream(mut self, downstream: DownstreamConfig) -> Self {
        self.downstream = Some(downstream);
        self
    }

    /// Sets the user agent prefix for outbound HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Builds the [`BridgeConfig`], validating required fields.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingRequiredField`] if `api_key` or `api_secret_key` is not set
    /// - [`ConfigError::InvalidCallbackPath`] if the callback path does not start with `/`
    /// - [`ConfigError::InvalidShopDomain`] if the domain suffix is empty or malformed
    /// - [`ConfigError::InvalidStateTtl`] if the state lifetime is not between
    ///   one second and [`BridgeConfig::MAX_STATE_TTL_SECS`]
    pub fn build(self) -> Result<BridgeConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;

        let callback_path = self
            .callback_path
            .unwrap_or_else(|| BridgeConfig::DEFAULT_CALLBACK_PATH.to_string());
        if !callback_path.starts_with('/') {
            return Err(ConfigError::InvalidCallbackPath {
                path: callback_path,
            });
        }

        let shop_domain_suffix = self
            .shop_domain_suffix
            .map_or_else(
                || ShopDomain::DEFAULT_SUFFIX.to_string(),
                |suffix| suffix.trim().trim_start_matches('.').to_lowercase(),
            );
        let suffix_is_valid = !shop_domain_suffix.is_empty()
            && shop_domain_suffix.contains('.')
            && shop_domain_suffix
                .split('.')
                .all(|label| !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
        if !suffix_is_valid {
            return Err(ConfigError::InvalidShopDomain {
                domain: shop_domain_suffix.clone(),
                suffix: shop_domain_suffix,
            });
        }

        let state_ttl = self
            .state_ttl
            .unwrap_or_else(|| chrono::Duration::seconds(BridgeConfig::DEFAULT_STATE_TTL_SECS));
        if state_ttl < chrono::Duration::seconds(1)
            || state_ttl > chrono::Duration::seconds(BridgeConfig::MAX_STATE_TTL_SECS)
        {
            return Err(ConfigError::InvalidStateTtl {
                seconds: state_ttl.num_seconds(),
                max_seconds: BridgeConfig::MAX_STATE_TTL_SECS,
            });
        }

        Ok(BridgeConfig {
            api_key,
            api_secret_key,
            webhook_secret: self.webhook_secret,
            scopes: self.scopes.unwrap_or_default(),
            host: self.host,
            callback_path,
            shop_domain_suffix,
            api_host: self.api_host,
            api_version: self.api_version.unwrap_or_default(),
            state_ttl,
            http_timeout: self
                .http_timeout
                .unwrap_or(Duration::from_secs(BridgeConfig::DEFAULT_HTTP_TIMEOUT_SECS)),
            downstream: self.downstream,
            user_agent_prefix: self.user_agent_prefix,
        })
    }
}
