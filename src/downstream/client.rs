//! HTTP client for the downstream store.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::{AccessCredential, AccessToken};
use crate::clients::build_reqwest_client;
use crate::config::{BridgeConfig, DownstreamConfig};
use crate::downstream::errors::DownstreamError;
use crate::webhooks::VerifiedWebhook;

/// Identifier sent in connectivity checks.
pub const PING_SOURCE: &str = "shopify-bridge";

/// A brand's connected store, as returned by the store lookup.
#[derive(Clone, Debug, Deserialize)]
pub struct StoreRecord {
    /// The shop's domain.
    pub shop_domain: String,
    /// The offline access token saved at install time.
    pub access_token: AccessToken,
}

#[derive(Deserialize)]
struct StoreLookupResponse {
    #[serde(default)]
    ok: bool,
    store: Option<StoreRecord>,
}

#[derive(Serialize)]
struct ForwardedWebhook<'a> {
    topic: &'a str,
    shop: &'a str,
    payload: &'a Value,
}

/// Client for the application backend that stores shop connections.
///
/// Every request is a JSON POST carrying the configured `x-api-key` header.
/// Calls are made once; failures are returned to the caller, which decides
/// whether they matter.
///
/// # Thread Safety
///
/// `DownstreamClient` is `Send + Sync` and is shared across handlers via `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// use shopify_bridge::downstream::DownstreamClient;
///
/// if let Some(client) = DownstreamClient::from_config(&config)? {
///     let reply = client.ping().await?;
///     println!("store answered: {reply}");
/// }
/// ```
#[derive(Debug)]
pub struct DownstreamClient {
    http: reqwest::Client,
    config: DownstreamConfig,
}

// Verify DownstreamClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DownstreamClient>();
};

impl DownstreamClient {
    /// Creates a client from an existing reqwest client.
    #[must_use]
    pub const fn new(config: DownstreamConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    /// Creates a client from the bridge configuration.
    ///
    /// Returns `Ok(None)` when no downstream store is configured.
    ///
    /// # Errors
    ///
    /// Returns [`DownstreamError::Client`] if the HTTP client cannot be built.
    pub fn from_config(config: &BridgeConfig) -> Result<Option<Self>, DownstreamError> {
        let Some(downstream) = config.downstream() else {
            return Ok(None);
        };
        let http =
            build_reqwest_client(config).map_err(|e| DownstreamError::Client(e.to_string()))?;
        Ok(Some(Self::new(downstream.clone(), http)))
    }

    /// Returns the endpoint configuration.
    #[must_use]
    pub const fn config(&self) -> &DownstreamConfig {
        &self.config
    }

    /// Persists a newly minted credential.
    ///
    /// # Errors
    ///
    /// Returns [`DownstreamError::NotConfigured`] without a save URL, or the
    /// failure of the POST.
    pub async fn save_connection(
        &self,
        credential: &AccessCredential,
    ) -> Result<Value, DownstreamError> {
        let url = Self::endpoint(
            self.config.save_connection_url_value(),
            "DOWNSTREAM_SAVE_CONNECTION_URL",
        )?;
        let (_, body) = self.post(url, &credential.to_connection_record()).await?;
        tracing::info!(shop = %credential.shop, "saved shop connection downstream");
        Ok(body)
    }

    /// Forwards a verified webhook as `{topic, shop, payload}`.
    ///
    /// Returns the status code the store answered with.
    ///
    /// # Errors
    ///
    /// Returns [`DownstreamError::NotConfigured`] without a webhook URL, or the
    /// failure of the POST.
    pub async fn forward_webhook(&self, webhook: &VerifiedWebhook) -> Result<u16, DownstreamError> {
        let url = Self::endpoint(self.config.webhook_url_value(), "DOWNSTREAM_WEBHOOK_URL")?;
        let body = ForwardedWebhook {
            topic: webhook.topic(),
            shop: webhook.shop_domain(),
            payload: webhook.payload(),
        };
        let (status, _) = self.post(url, &body).await?;
        Ok(status)
    }

    /// Looks up the store connected to `brand_id`.
    ///
    /// # Errors
    ///
    /// - [`DownstreamError::NotConfigured`] without a lookup URL
    /// - [`DownstreamError::Response`] if the lookup itself failed
    /// - [`DownstreamError::StoreNotFound`] if the answer has no `ok` store
    pub async fn lookup_store(&self, brand_id: &str) -> Result<StoreRecord, DownstreamError> {
        let url = Self::endpoint(
            self.config.store_lookup_url_value(),
            "DOWNSTREAM_STORE_LOOKUP_URL",
        )?;
        let (_, body) = self.post(url, &json!({ "brandId": brand_id })).await?;

        match serde_json::from_value::<StoreLookupResponse>(body.clone()) {
            Ok(StoreLookupResponse {
                ok: true,
                store: Some(store),
            }) => Ok(store),
            _ => Err(DownstreamError::StoreNotFound { details: body }),
        }
    }

    /// Checks connectivity to the store.
    ///
    /// # Errors
    ///
    /// Returns [`DownstreamError::NotConfigured`] without a ping URL, or the
    /// failure of the POST.
    pub async fn ping(&self) -> Result<Value, DownstreamError> {
        let url = Self::endpoint(self.config.ping_url_value(), "DOWNSTREAM_PING_URL")?;
        let (_, body) = self.post(url, &json!({ "from": PING_SOURCE })).await?;
        Ok(body)
    }

    fn endpoint<'a>(
        url: Option<&'a str>,
        field: &'static str,
    ) -> Result<&'a str, DownstreamError> {
        url.ok_or(DownstreamError::NotConfigured { field })
    }

    async fn post<T: Serialize + Sync + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<(u16, Value), DownstreamError> {
        let response = self
            .http
            .post(url)
            .header("x-api-key", self.config.api_key().as_ref())
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;

        if !(200..300).contains(&status) {
            return Err(DownstreamError::Response { status, body: text });
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok((status, body))
    }
}
