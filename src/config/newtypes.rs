//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use serde::{Serialize, Serializer};
use std::fmt;

/// A validated Shopify API key (the OAuth `client_id`).
///
/// # Example
///
/// ```rust
/// use shopify_bridge::ApiKey;
///
/// let key = ApiKey::new("my-api-key").unwrap();
/// assert_eq!(key.as_ref(), "my-api-key");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated secret: the OAuth `client_secret` or the webhook signing secret.
///
/// The value is kept byte-for-byte as provided. It is never trimmed or
/// re-encoded, so the HMAC key is exactly what was configured.
///
/// # Security
///
/// The `Debug` implementation masks the secret value, displaying only
/// `ApiSecretKey(*****)` instead of the actual key.
///
/// # Example
///
/// ```rust
/// use shopify_bridge::ApiSecretKey;
///
/// let secret = ApiSecretKey::new(" padded ").unwrap();
/// assert_eq!(secret.as_bytes(), b" padded ");
/// assert_eq!(format!("{:?}", secret), "ApiSecretKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecretKey(String);

impl ApiSecretKey {
    /// Creates a new validated API secret key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiSecretKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiSecretKey);
        }
        Ok(Self(key))
    }

    /// Returns the raw key bytes used as HMAC key material.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl AsRef<str> for ApiSecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// A validated shop domain belonging to the platform's domain suffix.
///
/// Shop domains arrive from untrusted query strings and headers and are used
/// to build outbound URLs, so anything that is not a single DNS label under
/// the expected suffix is rejected.
///
/// # Accepted Formats
///
/// - `shop-name` - normalized to `shop-name.{suffix}`
/// - `shop-name.{suffix}` - used as-is
///
/// # Example
///
/// ```rust
/// use shopify_bridge::ShopDomain;
///
/// let domain = ShopDomain::new("my-store").unwrap();
/// assert_eq!(domain.as_ref(), "my-store.myshopify.com");
/// assert_eq!(domain.shop_name(), "my-store");
///
/// let domain = ShopDomain::parse("shop.example.com", "example.com").unwrap();
/// assert_eq!(domain.as_ref(), "shop.example.com");
///
/// assert!(ShopDomain::new("evil.com").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopDomain {
    full_domain: String,
    shop_name_end: usize,
}

impl ShopDomain {
    /// The platform's default shop domain suffix.
    pub const DEFAULT_SUFFIX: &'static str = "myshopify.com";

    const MAX_LABEL_LEN: usize = 63;

    /// Creates a shop domain under [`Self::DEFAULT_SUFFIX`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the domain is invalid.
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        Self::parse(domain, Self::DEFAULT_SUFFIX)
    }

    /// Creates a shop domain under the given platform suffix.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the domain is not a single
    /// valid label under `suffix`.
    pub fn parse(domain: impl Into<String>, suffix: &str) -> Result<Self, ConfigError> {
        let domain = domain.into().trim().to_lowercase();
        let suffix = suffix.trim_start_matches('.');
        let invalid = |domain: String| ConfigError::InvalidShopDomain {
            domain,
            suffix: suffix.to_string(),
        };

        if domain.is_empty() || suffix.is_empty() {
            return Err(invalid(domain));
        }

        let dotted_suffix = format!(".{suffix}");
        let (shop_name, full_domain) =
            if let Some(shop_name) = domain.strip_suffix(dotted_suffix.as_str()) {
                (shop_name.to_string(), domain)
            } else if domain.contains('.') {
                return Err(invalid(domain));
            } else {
                (domain.clone(), format!("{domain}{dotted_suffix}"))
            };

        if !Self::is_valid_shop_name(&shop_name) {
            return Err(invalid(full_domain));
        }

        Ok(Self {
            shop_name_end: shop_name.len(),
            full_domain,
        })
    }

    /// Returns the shop name portion of the domain.
    ///
    /// For `my-store.myshopify.com`, this returns `my-store`.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        &self.full_domain[..self.shop_name_end]
    }

    fn is_valid_shop_name(name: &str) -> bool {
        if name.is_empty() || name.len() > Self::MAX_LABEL_LEN {
            return false;
        }

        if name.starts_with('-') || name.ends_with('-') {
            return false;
        }

        name.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.full_domain
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_domain)
    }
}

impl Serialize for ShopDomain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.full_domain)
    }
}

/// A validated absolute URL such as the backend base URL or an API host override.
///
/// # Example
///
/// ```rust
/// use shopify_bridge::HostUrl;
///
/// let url = HostUrl::new("http://localhost:3000/").unwrap();
/// assert_eq!(url.scheme(), "http");
/// assert_eq!(url.host_name(), Some("localhost"));
/// assert_eq!(url.origin(), "http://localhost:3000");
/// assert_eq!(url.join("/callback"), "http://localhost:3000/callback");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostUrl {
    url: String,
    scheme_end: usize,
    host_start: usize,
    host_end: usize,
    authority_end: usize,
}

impl HostUrl {
    /// Creates a new validated host URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHostUrl`] if the URL is invalid.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into().trim().to_string();
        let invalid = || ConfigError::InvalidHostUrl { url: url.clone() };

        let scheme_end = url.find("://").ok_or_else(invalid)?;

        let scheme = &url[..scheme_end];
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let host_start = scheme_end + 3;
        if host_start >= url.len() {
            return Err(invalid());
        }

        let remainder = &url[host_start..];
        let host_end = remainder
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);
        let authority_end = remainder
            .find(['/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);

        if host_end == host_start {
            return Err(invalid());
        }

        Ok(Self {
            url,
            scheme_end,
            host_start,
            host_end,
            authority_end,
        })
    }

    /// Returns the URL scheme (e.g., "https").
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.url[..self.scheme_end]
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        let host = &self.url[self.host_start..self.host_end];
        if host.is_empty() {
            None
        } else {
            Some(host)
        }
    }

    /// Returns `scheme://host[:port]` without any path.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.url[..self.authority_end]
    }

    /// Appends `path` to the URL, avoiding a doubled `/`.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_rejects_empty_string() {
        let result = ApiKey::new("");
        assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
    }

    #[test]
    fn test_api_secret_key_masks_value_in_debug() {
        let secret = ApiSecretKey::new("super-secret-key").unwrap();
        let debug_output = format!("{:?}", secret);
        assert_eq!(debug_output, "ApiSecretKey(*****)");
        assert!(!debug_output.contains("super-secret-key"));
    }

    #[test]
    fn test_api_secret_key_is_not_trimmed() {
        let secret = ApiSecretKey::new("secret\n").unwrap();
        assert_eq!(secret.as_bytes(), b"secret\n");
    }

    #[test]
    fn test_shop_domain_normalizes_short_format() {
        let domain = ShopDomain::new("my-store").unwrap();
        assert_eq!(domain.as_ref(), "my-store.myshopify.com");
        assert_eq!(domain.shop_name(), "my-store");
    }

    #[test]
    fn test_shop_domain_accepts_full_format() {
        let domain = ShopDomain::new("My-Store.myshopify.com ").unwrap();
        assert_eq!(domain.as_ref(), "my-store.myshopify.com");
        assert_eq!(domain.shop_name(), "my-store");
    }

    #[test]
    fn test_shop_domain_with_custom_suffix() {
        let domain = ShopDomain::parse("shop.example.com", "example.com").unwrap();
        assert_eq!(domain.as_ref(), "shop.example.com");
        assert_eq!(domain.shop_name(), "shop");

        let domain = ShopDomain::parse("shop", ".example.com").unwrap();
        assert_eq!(domain.as_ref(), "shop.example.com");
    }

    #[test]
    fn test_shop_domain_rejects_invalid_domains() {
        assert!(ShopDomain::new("").is_err());
        assert!(ShopDomain::new("my store").is_err());
        assert!(ShopDomain::new("my_store").is_err());
        assert!(ShopDomain::new("-my-store").is_err());
        assert!(ShopDomain::new("my-store-").is_err());
        assert!(ShopDomain::new("my-store.otherdomain.com").is_err());
        assert!(ShopDomain::new(".myshopify.com").is_err());
    }

    #[test]
    fn test_shop_domain_rejects_host_smuggling() {
        assert!(ShopDomain::new("a.b.myshopify.com").is_err());
        assert!(ShopDomain::new("evil.com/x.myshopify.com").is_err());
        assert!(ShopDomain::new("evil.com:443").is_err());
        assert!(ShopDomain::new("user@evil").is_err());
        assert!(ShopDomain::new("x".repeat(64)).is_err());
    }

    #[test]
    fn test_shop_domain_serializes_to_string() {
        let domain = ShopDomain::new("my-store").unwrap();
        let json = serde_json::to_string(&domain).unwrap();
        assert_eq!(json, r#""my-store.myshopify.com""#);
    }

    #[test]
    fn test_host_url_validates_format() {
        let url = HostUrl::new("https://myapp.example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_name(), Some("myapp.example.com"));
        assert_eq!(url.origin(), "https://myapp.example.com");

        let url = HostUrl::new("http://127.0.0.1:8080/base/path").unwrap();
        assert_eq!(url.host_name(), Some("127.0.0.1"));
        assert_eq!(url.origin(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_host_url_join() {
        let url = HostUrl::new("https://api.example.com").unwrap();
        assert_eq!(url.join("/callback"), "https://api.example.com/callback");

        let url = HostUrl::new("https://api.example.com/").unwrap();
        assert_eq!(url.join("callback"), "https://api.example.com/callback");
    }

    #[test]
    fn test_host_url_rejects_invalid() {
        assert!(HostUrl::new("myapp.example.com").is_err());
        assert!(HostUrl::new("https://").is_err());
        assert!(HostUrl::new("://example.com").is_err());
        assert!(HostUrl::new("https://:8080").is_err());
    }
}
