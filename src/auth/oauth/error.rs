//! OAuth-specific error types.
//!
//! # Error Types
//!
//! - [`OAuthError::InvalidShopDomain`]: The shop is not a host under the platform suffix
//! - [`OAuthError::MissingParameter`]: A required query parameter is absent or empty
//! - [`OAuthError::InvalidState`]: The state token failed verification
//! - [`OAuthError::TokenExchangeFailed`]: The token endpoint call failed
//! - [`OAuthError::Misconfigured`]: Local configuration cannot serve the request
//!
//! # Example
//!
//! ```rust
//! use shopify_bridge::auth::oauth::OAuthError;
//!
//! let error = OAuthError::MissingParameter { name: "code" };
//! assert_eq!(error.to_string(), "Missing required parameter 'code'");
//! ```

use crate::error::ConfigError;
use thiserror::Error;

/// Errors that can occur during the authorization flow.
///
/// # Thread Safety
///
/// `OAuthError` is `Send + Sync`, making it safe to use across async boundaries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OAuthError {
    /// The shop value is not a well-formed host under the platform suffix.
    #[error("Invalid shop domain '{domain}'")]
    InvalidShopDomain {
        /// The rejected value.
        domain: String,
    },

    /// A required parameter is absent or empty.
    #[error("Missing required parameter '{name}'")]
    MissingParameter {
        /// The parameter name.
        name: &'static str,
    },

    /// The state token did not verify.
    ///
    /// This is the CSRF defense: a forged, foreign, expired or replayed
    /// state is rejected before any code is exchanged.
    #[error("Invalid OAuth state: {reason}")]
    InvalidState {
        /// Why the state was rejected.
        reason: String,
    },

    /// The token exchange did not yield an access token.
    ///
    /// `status` is the upstream HTTP status, or `0` when no response was
    /// received. `message` carries the upstream body with the client secret
    /// redacted.
    #[error("Token exchange failed with status {status}: {message}")]
    TokenExchangeFailed {
        /// The HTTP status code returned.
        status: u16,
        /// The upstream body or transport error.
        message: String,
    },

    /// Local configuration cannot serve this request.
    #[error("OAuth is misconfigured: {reason}")]
    Misconfigured {
        /// What is missing or invalid.
        reason: String,
    },
}

impl From<ConfigError> for OAuthError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::InvalidShopDomain { domain, .. } => Self::InvalidShopDomain { domain },
            other => Self::Misconfigured {
                reason: other.to_string(),
            },
        }
    }
}

// Verify OAuthError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};
