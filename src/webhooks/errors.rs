//! Webhook verification error types.
//!
//! - [`WebhookError::MissingSignature`]: No signature header was sent
//! - [`WebhookError::InvalidSignature`]: The signature does not match the body
//! - [`WebhookError::MalformedPayload`]: Authentic body that is not valid JSON
//! - [`WebhookError::MissingHeader`]: An identifying header is absent
//! - [`WebhookError::Misconfigured`]: No usable signing secret
//!
//! # Example
//!
//! ```rust
//! use shopify_bridge::webhooks::WebhookError;
//!
//! assert_eq!(WebhookError::InvalidSignature.to_string(), "Invalid HMAC");
//! ```

use thiserror::Error;

/// Error type for webhook verification.
///
/// Signature failures are kept apart from payload failures: a
/// [`WebhookError::MalformedPayload`] means the sender was authenticated but
/// the content is unusable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebhookError {
    /// The signature header is absent or empty.
    #[error("Missing HMAC signature header")]
    MissingSignature,

    /// The signature does not match the raw body.
    #[error("Invalid HMAC")]
    InvalidSignature,

    /// The body is authentic but not valid JSON.
    #[error("Malformed webhook payload: {reason}")]
    MalformedPayload {
        /// The parser's description of the problem.
        reason: String,
    },

    /// A required identifying header is absent or empty.
    #[error("Missing required header '{name}'")]
    MissingHeader {
        /// The header name.
        name: &'static str,
    },

    /// No signing secret is available, so nothing can be verified.
    #[error("Webhook verification is misconfigured: {reason}")]
    Misconfigured {
        /// What is missing.
        reason: String,
    },
}

impl WebhookError {
    /// Returns `true` for failures that mean the request is not authentic.
    #[must_use]
    pub const fn is_signature_failure(&self) -> bool {
        matches!(self, Self::MissingSignature | Self::InvalidSignature)
    }
}

// Verify WebhookError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookError>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_signature_message() {
        assert_eq!(WebhookError::InvalidSignature.to_string(), "Invalid HMAC");
    }

    #[test]
    fn test_missing_header_names_header() {
        let error = WebhookError::MissingHeader {
            name: "X-Shopify-Topic",
        };
        assert!(error.to_string().contains("X-Shopify-Topic"));
    }

    #[test]
    fn test_signature_failures_are_classified() {
        assert!(WebhookError::MissingSignature.is_signature_failure());
        assert!(WebhookError::InvalidSignature.is_signature_failure());
        assert!(!WebhookError::MalformedPayload {
            reason: "eof".to_string()
        }
        .is_signature_failure());
    }

    #[test]
    fn test_webhook_error_implements_std_error() {
        let error: &dyn std::error::Error = &WebhookError::MissingSignature;
        let _ = error;
    }
}
