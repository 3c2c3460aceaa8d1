//! Authenticated Admin API client.
//!
//! This module provides [`AdminClient`] for calls made on behalf of a shop
//! with an offline access token, and [`build_reqwest_client`], which every
//! outbound call in the crate uses so the configured timeout always applies.

use std::collections::HashMap;

use crate::auth::AccessToken;
use crate::clients::errors::{HttpError, HttpResponseError};
use crate::clients::http_response::HttpResponse;
use crate::config::{BridgeConfig, ShopDomain};

/// Crate version from Cargo.toml.
pub const BRIDGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the `User-Agent` sent on every outbound request.
#[must_use]
pub fn user_agent(config: &BridgeConfig) -> String {
    let prefix = config
        .user_agent_prefix()
        .map_or(String::new(), |prefix| format!("{prefix} | "));
    let rust_version = env!("CARGO_PKG_RUST_VERSION");
    format!("{prefix}shopify-bridge v{BRIDGE_VERSION} | Rust {rust_version}")
}

/// Builds a reqwest client with the configured timeout and user agent.
///
/// # Errors
///
/// Returns the reqwest error if the TLS backend cannot be initialized.
pub fn build_reqwest_client(config: &BridgeConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(config.http_timeout())
        .user_agent(user_agent(config))
        .build()
}

/// HTTP client for the Shopify Admin REST API of one shop.
///
/// The client handles:
/// - Base URI construction from the shop domain or the `api_host` override
/// - The versioned base path (`/admin/api/{version}`)
/// - Default headers including the access token
/// - Shopify-style error serialization
///
/// Requests are sent once; there is no automatic retry.
///
/// # Thread Safety
///
/// `AdminClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use shopify_bridge::clients::AdminClient;
///
/// let client = AdminClient::new(&config, &shop, &access_token)?;
/// let response = client.post_json("price_rules.json", &body).await?;
/// ```
#[derive(Debug)]
pub struct AdminClient {
    client: reqwest::Client,
    /// Base URI (e.g., `https://my-store.myshopify.com`).
    base_uri: String,
    /// Base path (e.g., "/admin/api/2024-01").
    base_path: String,
    default_headers: HashMap<String, String>,
}

// Verify AdminClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AdminClient>();
};

impl AdminClient {
    /// Creates a client for `shop` authenticated with `access_token`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Client`] if the underlying reqwest client cannot
    /// be created.
    pub fn new(
        config: &BridgeConfig,
        shop: &ShopDomain,
        access_token: &AccessToken,
    ) -> Result<Self, HttpError> {
        let client =
            build_reqwest_client(config).map_err(|e| HttpError::Client(e.to_string()))?;
        Ok(Self::with_client(client, config, shop, access_token))
    }

    /// Creates a client on top of an existing reqwest client, sharing its
    /// connection pool.
    #[must_use]
    pub fn with_client(
        client: reqwest::Client,
        config: &BridgeConfig,
        shop: &ShopDomain,
        access_token: &AccessToken,
    ) -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        default_headers.insert(
            "X-Shopify-Access-Token".to_string(),
            access_token.expose().to_string(),
        );

        Self {
            client,
            base_uri: config.shop_origin(shop),
            base_path: format!("/admin/api/{}", config.api_version()),
            default_headers,
        }
    }

    /// Returns the base URI for this client.
    #[must_use]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Returns the base path for this client.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// POSTs a JSON body to `path`, relative to the versioned base path.
    ///
    /// # Errors
    ///
    /// - [`HttpError::Network`] if the request could not be sent or its body
    ///   could not be read
    /// - [`HttpError::Response`] for any non-2xx status
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, HttpError> {
        let url = format!(
            "{}{}/{}",
            self.base_uri,
            self.base_path,
            path.trim_start_matches('/')
        );

        let mut req_builder = self.client.post(&url).json(body);
        for (key, value) in &self.default_headers {
            req_builder = req_builder.header(key, value);
        }

        let res = req_builder.send().await?;

        let code = res.status().as_u16();
        let res_headers = Self::parse_response_headers(res.headers());
        let body_text = res.text().await?;

        let body = if body_text.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&body_text)
                .unwrap_or_else(|_| serde_json::json!({ "raw_body": body_text }))
        };

        let response = HttpResponse::new(code, res_headers, body);

        if let Some(reason) = response.deprecation_reason() {
            tracing::warn!(path, reason, "deprecated request to Shopify Admin API");
        }

        if response.is_ok() {
            return Ok(response);
        }

        Err(HttpError::Response(HttpResponseError {
            code,
            message: Self::serialize_error(&response),
            error_reference: response.request_id().map(String::from),
            body: response.body,
        }))
    }

    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    fn serialize_error(response: &HttpResponse) -> String {
        let mut error_body = serde_json::Map::new();

        for field in ["errors", "error", "error_description", "raw_body"] {
            if let Some(value) = response.body.get(field) {
                error_body.insert(field.to_string(), value.clone());
            }
        }

        if let Some(request_id) = response.request_id() {
            error_body.insert(
                "error_reference".to_string(),
                serde_json::json!(format!(
                    "If you report this error, please include this id: {request_id}."
                )),
            );
        }

        serde_json::Value::Object(error_body).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, ApiVersion, HostUrl};
    use serde_json::json;

    fn config() -> BridgeConfig {
        BridgeConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_client_uses_shop_origin_and_version() {
        let shop = ShopDomain::new("test-shop").unwrap();
        let client = AdminClient::new(&config(), &shop, &AccessToken::new("token")).unwrap();

        assert_eq!(client.base_uri(), "https://test-shop.myshopify.com");
        assert_eq!(client.base_path(), "/admin/api/2024-01");
        assert_eq!(
            client.default_headers.get("X-Shopify-Access-Token"),
            Some(&"token".to_string())
        );
    }

    #[test]
    fn test_client_honors_api_host_and_version_override() {
        let config = BridgeConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .api_host(HostUrl::new("http://127.0.0.1:4010").unwrap())
            .api_version(ApiVersion::Unstable)
            .build()
            .unwrap();
        let shop = ShopDomain::new("test-shop").unwrap();
        let client = AdminClient::new(&config, &shop, &AccessToken::new("token")).unwrap();

        assert_eq!(client.base_uri(), "http://127.0.0.1:4010");
        assert_eq!(client.base_path(), "/admin/api/unstable");
    }

    #[test]
    fn test_with_client_shares_configuration() {
        let config = config();
        let http = build_reqwest_client(&config).unwrap();
        let shop = ShopDomain::new("test-shop").unwrap();
        let client = AdminClient::with_client(http, &config, &shop, &AccessToken::new("token"));

        assert_eq!(client.base_uri(), "https://test-shop.myshopify.com");
        assert_eq!(client.base_path(), "/admin/api/2024-01");
    }

    #[test]
    fn test_user_agent_includes_prefix() {
        let config = BridgeConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .user_agent_prefix("Affiliate Bridge")
            .build()
            .unwrap();

        let agent = user_agent(&config);
        assert!(agent.starts_with("Affiliate Bridge | shopify-bridge v"));
        assert!(user_agent(&self::config()).starts_with("shopify-bridge v"));
    }

    /// Serves one response whose body is cut short of its `Content-Length`.
    fn serve_truncated_body() -> String {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0_u8; 1024];
            loop {
                let n = stream.read(&mut buf).unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_lowercase();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|value| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            stream
                .write_all(b"HTTP/1.1 201 Created\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"price_rule\"")
                .unwrap();
            stream.flush().unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_unreadable_body_is_network_error() {
        let config = BridgeConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .api_host(HostUrl::new(serve_truncated_body()).unwrap())
            .build()
            .unwrap();
        let shop = ShopDomain::new("test-shop").unwrap();
        let client = AdminClient::new(&config, &shop, &AccessToken::new("token")).unwrap();

        let result = client.post_json("price_rules.json", &json!({})).await;

        assert!(matches!(result, Err(HttpError::Network(_))), "{result:?}");
    }

    #[test]
    fn test_serialize_error_keeps_shopify_fields() {
        let mut headers = HashMap::new();
        headers.insert("x-request-id".to_string(), vec!["abc".to_string()]);
        let response = HttpResponse::new(
            422,
            headers,
            json!({"errors": {"code": ["must be unique"]}, "other": 1}),
        );

        let message: serde_json::Value =
            serde_json::from_str(&AdminClient::serialize_error(&response)).unwrap();
        assert_eq!(message["errors"]["code"][0], "must be unique");
        assert!(message.get("other").is_none());
        assert!(message["error_reference"]
            .as_str()
            .unwrap()
            .contains("abc"));
    }
}
