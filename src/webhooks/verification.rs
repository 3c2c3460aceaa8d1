//! Webhook signature verification.
//!
//! Shopify signs every delivery with HMAC-SHA256 over the exact request body
//! and sends the base64 digest in `X-Shopify-Hmac-SHA256`. Verification here
//! only ever sees raw bytes: a [`WebhookEnvelope`] can only be built from the
//! body as received, and [`VerifiedWebhook`] can only be built by this module
//! after the digest matched.
//!
//! - [`verify_hmac`]: Signature check only
//! - [`verify_payload`]: Signature check, then JSON parse
//! - [`verify_webhook`]: Full pipeline over an envelope, yielding a [`VerifiedWebhook`]
//! - [`WebhookVerifier`]: Owns the one canonical signing secret
//!
//! # Example
//!
//! ```rust
//! use shopify_bridge::webhooks::{WebhookEnvelope, WebhookVerifier};
//! use shopify_bridge::auth::oauth::hmac::compute_signature_base64;
//! use shopify_bridge::ApiSecretKey;
//!
//! let verifier = WebhookVerifier::new(ApiSecretKey::new("topsecret").unwrap());
//!
//! let body = br##"{"id":123,"name":"#1001"}"##;
//! let envelope = WebhookEnvelope::new(
//!     body.to_vec(),
//!     Some(compute_signature_base64(body, b"topsecret")),
//!     Some("orders/create".to_string()),
//!     Some("shop.myshopify.com".to_string()),
//!     None,
//!     None,
//! );
//!
//! let verified = verifier.verify(&envelope).unwrap();
//! assert_eq!(verified.topic(), "orders/create");
//! assert_eq!(verified.payload()["id"], 123);
//! ```
//!
//! # Security
//!
//! Digests are compared in constant time. Exactly one secret is tried, byte
//! for byte as configured; there is no fallback to trimmed or re-encoded
//! variants.

use serde_json::Value;

use crate::auth::oauth::hmac::{compute_signature_base64, constant_time_eq};
use crate::config::{ApiSecretKey, BridgeConfig};
use crate::webhooks::WebhookError;

/// HTTP header name for the HMAC-SHA256 signature.
///
/// The value is the base64-encoded HMAC-SHA256 of the request body.
pub const HEADER_HMAC: &str = "X-Shopify-Hmac-SHA256";

/// HTTP header name for the webhook topic (e.g., "orders/create").
pub const HEADER_TOPIC: &str = "X-Shopify-Topic";

/// HTTP header name for the shop domain that triggered the webhook.
pub const HEADER_SHOP_DOMAIN: &str = "X-Shopify-Shop-Domain";

/// HTTP header name for the API version of the payload format.
pub const HEADER_API_VERSION: &str = "X-Shopify-API-Version";

/// HTTP header name for the delivery id.
///
/// Redeliveries of the same event carry the same id.
pub const HEADER_WEBHOOK_ID: &str = "X-Shopify-Webhook-Id";

/// An inbound webhook delivery, exactly as received.
///
/// The body is stored as raw bytes and is never re-serialized. There is no
/// constructor from a parsed value.
#[derive(Debug, Clone)]
pub struct WebhookEnvelope {
    body: Vec<u8>,
    hmac_header: Option<String>,
    topic: Option<String>,
    shop_domain: Option<String>,
    api_version: Option<String>,
    webhook_id: Option<String>,
}

impl WebhookEnvelope {
    /// Creates an envelope from the raw body and header values.
    #[must_use]
    pub fn new(
        body: impl Into<Vec<u8>>,
        hmac_header: Option<String>,
        topic: Option<String>,
        shop_domain: Option<String>,
        api_version: Option<String>,
        webhook_id: Option<String>,
    ) -> Self {
        Self {
            body: body.into(),
            hmac_header,
            topic,
            shop_domain,
            api_version,
            webhook_id,
        }
    }

    /// Creates an envelope, reading the Shopify headers through `header`.
    ///
    /// `header` receives the canonical header names above; lookups should be
    /// case-insensitive, as HTTP header maps are.
    #[must_use]
    pub fn from_header_lookup<F>(body: impl Into<Vec<u8>>, header: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(
            body,
            header(HEADER_HMAC),
            header(HEADER_TOPIC),
            header(HEADER_SHOP_DOMAIN),
            header(HEADER_API_VERSION),
            header(HEADER_WEBHOOK_ID),
        )
    }

    /// Uses `topic` when the delivery did not carry a topic header.
    ///
    /// For endpoints dedicated to a single topic.
    #[must_use]
    pub fn with_default_topic(mut self, topic: &str) -> Self {
        if self.topic().is_none() {
            self.topic = Some(topic.to_string());
        }
        self
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the signature header value, if present and non-empty.
    #[must_use]
    pub fn hmac_header(&self) -> Option<&str> {
        non_empty(self.hmac_header.as_deref())
    }

    /// Returns the topic header value, if present and non-empty.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        non_empty(self.topic.as_deref())
    }

    /// Returns the shop domain header value, if present and non-empty.
    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        non_empty(self.shop_domain.as_deref())
    }

    /// Returns the API version header value, if present.
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        non_empty(self.api_version.as_deref())
    }

    /// Returns the delivery id header value, if present.
    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        non_empty(self.webhook_id.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// A webhook whose signature has been verified.
///
/// This is the only form handed to downstream consumers. Deliveries are
/// at-least-once, so consumers should de-duplicate on
/// [`VerifiedWebhook::idempotency_key`].
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedWebhook {
    topic: String,
    shop_domain: String,
    payload: Value,
    api_version: Option<String>,
    webhook_id: Option<String>,
}

impl VerifiedWebhook {
    /// Returns the topic (e.g., "orders/create").
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the shop domain the delivery is for.
    #[must_use]
    pub fn shop_domain(&self) -> &str {
        &self.shop_domain
    }

    /// Returns the parsed payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Consumes the webhook, returning the parsed payload.
    #[must_use]
    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// Returns the payload API version, if sent.
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// Returns the delivery id, if sent.
    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }

    /// Returns a key that is identical across redeliveries of one event.
    ///
    /// This is the delivery id when Shopify sent one, otherwise
    /// `{topic}:{payload.id}`. Returns `None` when neither is available.
    #[must_use]
    pub fn idempotency_key(&self) -> Option<String> {
        if let Some(id) = &self.webhook_id {
            return Some(id.clone());
        }
        match self.payload.get("id") {
            Some(Value::Number(id)) => Some(format!("{}:{id}", self.topic)),
            Some(Value::String(id)) if !id.is_empty() => Some(format!("{}:{id}", self.topic)),
            _ => None,
        }
    }
}

/// Checks `hmac_header` against the HMAC-SHA256 of `raw_body`.
///
/// # Example
///
/// ```rust
/// use shopify_bridge::webhooks::verify_hmac;
/// use shopify_bridge::auth::oauth::hmac::compute_signature_base64;
///
/// let body = b"webhook payload";
/// let hmac = compute_signature_base64(body, b"my-secret");
///
/// assert!(verify_hmac(body, &hmac, b"my-secret"));
/// assert!(!verify_hmac(body, "invalid", b"my-secret"));
/// ```
#[must_use]
pub fn verify_hmac(raw_body: &[u8], hmac_header: &str, secret: &[u8]) -> bool {
    let computed = compute_signature_base64(raw_body, secret);
    constant_time_eq(computed.as_bytes(), hmac_header.as_bytes())
}

/// Verifies the signature of `raw_body`, then parses it as JSON.
///
/// This is a pure function of its inputs.
///
/// # Errors
///
/// - [`WebhookError::MissingSignature`] if `hmac_header` is `None` or empty,
///   whatever the body
/// - [`WebhookError::InvalidSignature`] if the digest does not match
/// - [`WebhookError::MalformedPayload`] if the authentic body is not JSON
pub fn verify_payload(
    raw_body: &[u8],
    hmac_header: Option<&str>,
    secret: &[u8],
) -> Result<Value, WebhookError> {
    let hmac_header = non_empty(hmac_header).ok_or(WebhookError::MissingSignature)?;

    if !verify_hmac(raw_body, hmac_header, secret) {
        return Err(WebhookError::InvalidSignature);
    }

    serde_json::from_slice(raw_body).map_err(|e| WebhookError::MalformedPayload {
        reason: e.to_string(),
    })
}

/// Verifies an envelope and returns the trusted webhook.
///
/// # Errors
///
/// The errors of [`verify_payload`], then
/// [`WebhookError::MissingHeader`] if the topic or shop domain is absent.
pub fn verify_webhook(
    secret: &ApiSecretKey,
    envelope: &WebhookEnvelope,
) -> Result<VerifiedWebhook, WebhookError> {
    let payload = verify_payload(envelope.body(), envelope.hmac_header(), secret.as_bytes())?;

    let topic = envelope
        .topic()
        .ok_or(WebhookError::MissingHeader { name: HEADER_TOPIC })?;
    let shop_domain = envelope.shop_domain().ok_or(WebhookError::MissingHeader {
        name: HEADER_SHOP_DOMAIN,
    })?;

    Ok(VerifiedWebhook {
        topic: topic.to_string(),
        shop_domain: shop_domain.to_string(),
        payload,
        api_version: envelope.api_version().map(String::from),
        webhook_id: envelope.webhook_id().map(String::from),
    })
}

/// Verifies webhook deliveries against one canonical secret.
///
/// # Thread Safety
///
/// `WebhookVerifier` is stateless apart from the secret and is `Send + Sync`.
#[derive(Clone, Debug)]
pub struct WebhookVerifier {
    secret: ApiSecretKey,
}

impl WebhookVerifier {
    /// Creates a verifier for `secret`.
    #[must_use]
    pub const fn new(secret: ApiSecretKey) -> Self {
        Self { secret }
    }

    /// Creates a verifier for the configured webhook secret.
    #[must_use]
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.webhook_secret().clone())
    }

    /// Creates a verifier from a raw secret value.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::Misconfigured`] if `secret` is empty.
    pub fn from_raw(secret: impl Into<String>) -> Result<Self, WebhookError> {
        ApiSecretKey::new(secret)
            .map(Self::new)
            .map_err(|e| WebhookError::Misconfigured {
                reason: e.to_string(),
            })
    }

    /// Verifies an envelope. See [`verify_webhook`].
    ///
    /// # Errors
    ///
    /// See [`verify_webhook`].
    pub fn verify(&self, envelope: &WebhookEnvelope) -> Result<VerifiedWebhook, WebhookError> {
        verify_webhook(&self.secret, envelope)
    }

    /// Verifies a raw body and signature. See [`verify_payload`].
    ///
    /// # Errors
    ///
    /// See [`verify_payload`].
    pub fn verify_payload(
        &self,
        raw_body: &[u8],
        hmac_header: Option<&str>,
    ) -> Result<Value, WebhookError> {
        verify_payload(raw_body, hmac_header, self.secret.as_bytes())
    }
}

// Verify WebhookVerifier is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookVerifier>();
};
