//! Error types for downstream store calls.

use thiserror::Error;

/// Errors from calls to the downstream store.
///
/// # Example
///
/// ```rust
/// use shopify_bridge::downstream::DownstreamError;
///
/// let error = DownstreamError::NotConfigured { field: "DOWNSTREAM_WEBHOOK_URL" };
/// assert_eq!(error.to_string(), "Downstream store is not configured: DOWNSTREAM_WEBHOOK_URL");
/// ```
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// The endpoint (or the whole downstream section) is not configured.
    #[error("Downstream store is not configured: {field}")]
    NotConfigured {
        /// The missing setting.
        field: &'static str,
    },

    /// The request could not be sent or its body could not be read.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The store answered with a non-2xx status.
    #[error("Downstream store returned {status}: {body}")]
    Response {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The store lookup answered, but without a usable store.
    #[error("Store not found: {details}")]
    StoreNotFound {
        /// The lookup response as received.
        details: serde_json::Value,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl DownstreamError {
    /// Returns the upstream status code, if a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }
}
