//! HTTP error responses.
//!
//! Every failed route answers with `{"ok": false, "error": ...}`, plus
//! `details` or `step` when there is something useful to add.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::auth::oauth::OAuthError;
use crate::discounts::DiscountError;
use crate::downstream::DownstreamError;
use crate::webhooks::WebhookError;

/// A failed request, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ErrorBody {
    ok: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ApiError {
    /// Creates an error with a status and message.
    #[must_use]
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                ok: false,
                error: error.into(),
                step: None,
                details: None,
            },
        }
    }

    /// Shorthand for a 400 response.
    #[must_use]
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Shorthand for a 500 response.
    #[must_use]
    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    /// Attaches `details` to the body.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<Value>) -> Self {
        self.body.details = Some(details.into());
        self
    }

    /// Attaches the failed step to the body.
    #[must_use]
    pub const fn with_step(mut self, step: &'static str) -> Self {
        self.body.step = Some(step);
        self
    }

    /// Returns the response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.body.error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<OAuthError> for ApiError {
    fn from(error: OAuthError) -> Self {
        let status = match &error {
            OAuthError::MissingParameter { .. } | OAuthError::InvalidShopDomain { .. } => {
                StatusCode::BAD_REQUEST
            }
            OAuthError::InvalidState { .. } => StatusCode::FORBIDDEN,
            OAuthError::TokenExchangeFailed { .. } => StatusCode::BAD_GATEWAY,
            OAuthError::Misconfigured { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, error.to_string())
    }
}

impl From<WebhookError> for ApiError {
    fn from(error: WebhookError) -> Self {
        match &error {
            WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                Self::new(StatusCode::UNAUTHORIZED, "Invalid HMAC")
            }
            WebhookError::MalformedPayload { .. } | WebhookError::MissingHeader { .. } => {
                Self::bad_request(error.to_string())
            }
            WebhookError::Misconfigured { .. } => Self::internal(error.to_string()),
        }
    }
}

impl From<DownstreamError> for ApiError {
    fn from(error: DownstreamError) -> Self {
        match error {
            DownstreamError::StoreNotFound { details } => {
                Self::new(StatusCode::NOT_FOUND, "Store not found").with_details(details)
            }
            DownstreamError::Response { status, body } => {
                Self::internal(format!("Downstream store returned {status}")).with_details(body)
            }
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<DiscountError> for ApiError {
    fn from(error: DiscountError) -> Self {
        match error {
            DiscountError::InvalidInput { reason } => Self::bad_request(reason),
            DiscountError::Step { step, source } => {
                let api_error = Self::bad_request(source.to_string()).with_step(step);
                match source {
                    crate::clients::HttpError::Response(e) => api_error.with_details(e.body),
                    _ => api_error,
                }
            }
            DiscountError::UnexpectedResponse { step, reason } => {
                Self::internal(reason).with_step(step)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signature_failures_render_as_invalid_hmac() {
        for error in [WebhookError::MissingSignature, WebhookError::InvalidSignature] {
            let api_error = ApiError::from(error);
            assert_eq!(api_error.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(api_error.message(), "Invalid HMAC");
        }
    }

    #[test]
    fn test_webhook_request_errors_are_client_errors() {
        let error = ApiError::from(WebhookError::MissingHeader {
            name: "X-Shopify-Topic",
        });
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);

        let error = ApiError::from(WebhookError::Misconfigured {
            reason: "no secret".to_string(),
        });
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_oauth_error_statuses() {
        let cases = [
            (
                OAuthError::MissingParameter { name: "shop" },
                StatusCode::BAD_REQUEST,
            ),
            (
                OAuthError::InvalidState {
                    reason: "expired".to_string(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                OAuthError::TokenExchangeFailed {
                    status: 400,
                    message: "bad code".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                OAuthError::Misconfigured {
                    reason: "no host".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn test_store_not_found_keeps_details() {
        let error = ApiError::from(DownstreamError::StoreNotFound {
            details: json!({"ok": false}),
        });
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.body.details, Some(json!({"ok": false})));
    }

    #[test]
    fn test_body_omits_empty_fields() {
        let body = serde_json::to_value(&ApiError::bad_request("nope").body).unwrap();
        assert_eq!(body, json!({"ok": false, "error": "nope"}));

        let body =
            serde_json::to_value(&ApiError::bad_request("x").with_step("create_price_rule").body)
                .unwrap();
        assert_eq!(body["step"], "create_price_rule");
    }
}
