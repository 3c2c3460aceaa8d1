//! HTTP error types for Admin API calls.
//!
//! - [`HttpResponseError`]: Non-2xx HTTP responses from the API
//! - [`HttpError`]: Unified error type for all Admin API calls
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_bridge::clients::HttpError;
//!
//! match client.post_json("price_rules.json", &body).await {
//!     Ok(response) => println!("Created: {}", response.body),
//!     Err(HttpError::Response(e)) => println!("API error {}: {}", e.code, e.message),
//!     Err(HttpError::Network(e)) => println!("Network error: {e}"),
//!     Err(HttpError::Client(e)) => println!("Client setup failed: {e}"),
//! }
//! ```

use thiserror::Error;

/// Error returned when an Admin API call receives a non-successful response.
///
/// `message` is a JSON object holding the `errors` / `error` /
/// `error_description` fields Shopify returned, plus an `error_reference`
/// built from `X-Request-Id` when present.
///
/// # Example
///
/// ```rust
/// use shopify_bridge::clients::HttpResponseError;
///
/// let error = HttpResponseError {
///     code: 422,
///     message: r#"{"errors":{"title":["can't be blank"]}}"#.to_string(),
///     error_reference: None,
///     body: serde_json::json!({"errors": {"title": ["can't be blank"]}}),
/// };
/// assert_eq!(error.to_string(), r#"{"errors":{"title":["can't be blank"]}}"#);
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// Serialized error message in JSON format.
    pub message: String,
    /// Reference ID for error reporting (from X-Request-Id header).
    pub error_reference: Option<String>,
    /// The full parsed response body.
    pub body: serde_json::Value,
}

/// Unified error type for Admin API calls.
#[derive(Debug, Error)]
pub enum HttpError {
    /// An HTTP response error (non-2xx status code).
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl HttpError {
    /// Returns the upstream status code, if a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response(e) => Some(e.code),
            Self::Network(_) | Self::Client(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_response_error_displays_message() {
        let error = HttpResponseError {
            code: 404,
            message: r#"{"errors":"Not Found"}"#.to_string(),
            error_reference: None,
            body: json!({"errors": "Not Found"}),
        };
        assert_eq!(error.to_string(), r#"{"errors":"Not Found"}"#);
    }

    #[test]
    fn test_http_error_from_response_error() {
        let error: HttpError = HttpResponseError {
            code: 422,
            message: "{}".to_string(),
            error_reference: Some("req-1".to_string()),
            body: json!({}),
        }
        .into();
        assert_eq!(error.status(), Some(422));
    }

    #[test]
    fn test_client_error_has_no_status() {
        let error = HttpError::Client("tls".to_string());
        assert_eq!(error.status(), None);
        assert!(error.to_string().contains("tls"));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let error: &dyn std::error::Error = &HttpError::Client("x".to_string());
        let _ = error;
    }
}
