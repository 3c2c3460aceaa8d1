//! Configuration error types for the bridge.
//!
//! Every configuration constructor returns `Result<T, ConfigError>` so that a
//! misconfigured deployment fails at startup instead of on the first request.
//!
//! # Example
//!
//! ```rust
//! use shopify_bridge::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```

use thiserror::Error;

/// Errors that can occur while building or loading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API key cannot be empty.
    #[error("API key cannot be empty. Please provide a valid Shopify API key.")]
    EmptyApiKey,

    /// API secret key cannot be empty.
    #[error("API secret key cannot be empty. Please provide a valid Shopify API secret key.")]
    EmptyApiSecretKey,

    /// Shop domain is invalid.
    #[error("Invalid shop domain '{domain}'. Expected 'shop-name' or 'shop-name.{suffix}'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
        /// The platform domain suffix the shop must belong to.
        suffix: String,
    },

    /// API version is invalid.
    #[error("Invalid API version '{version}'. Expected format: 'YYYY-MM' (e.g., '2024-01') or 'unstable'.")]
    InvalidApiVersion {
        /// The invalid version string that was provided.
        version: String,
    },

    /// Scopes are invalid.
    #[error("Invalid scopes: {reason}")]
    InvalidScopes {
        /// The reason the scopes are invalid.
        reason: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// Host URL is invalid.
    #[error("Invalid host URL '{url}'. Please provide a valid URL with scheme (e.g., 'https://myapp.example.com').")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Callback path is invalid.
    #[error("Invalid callback path '{path}'. The path must start with '/'.")]
    InvalidCallbackPath {
        /// The invalid path that was provided.
        path: String,
    },

    /// A required environment variable is missing or empty.
    #[error("Missing environment variable '{name}'.")]
    MissingEnvVar {
        /// The name of the environment variable.
        name: &'static str,
    },

    /// An environment variable holds a value that cannot be parsed.
    #[error("Invalid value for environment variable '{name}': {reason}")]
    InvalidEnvVar {
        /// The name of the environment variable.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// State token lifetime is outside the accepted range.
    #[error("Invalid state lifetime of {seconds}s. It must be between 1 second and {max_seconds}s.")]
    InvalidStateTtl {
        /// The rejected lifetime, in seconds.
        seconds: i64,
        /// The largest accepted lifetime, in seconds.
        max_seconds: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_error_message() {
        let error = ConfigError::EmptyApiKey;
        let message = error.to_string();
        assert!(message.contains("API key cannot be empty"));
    }

    #[test]
    fn test_invalid_shop_domain_error_message_names_suffix() {
        let error = ConfigError::InvalidShopDomain {
            domain: "bad domain!".to_string(),
            suffix: "myshopify.com".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("bad domain!"));
        assert!(message.contains("shop-name.myshopify.com"));
    }

    #[test]
    fn test_missing_env_var_error_message() {
        let error = ConfigError::MissingEnvVar {
            name: "SHOPIFY_API_SECRET",
        };
        assert_eq!(
            error.to_string(),
            "Missing environment variable 'SHOPIFY_API_SECRET'."
        );
    }

    #[test]
    fn test_invalid_state_ttl_error_message() {
        let error = ConfigError::InvalidStateTtl {
            seconds: 0,
            max_seconds: 86_400,
        };
        assert!(error.to_string().contains("0s"));
        assert!(error.to_string().contains("86400s"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::EmptyApiKey;
        let _: &dyn std::error::Error = &error;
    }
}
