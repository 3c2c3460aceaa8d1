//! Webhook authenticity verification.
//!
//! Each delivery passes through one state machine, with no retry:
//!
//! ```text
//! RECEIVE_RAW -> (no signature header) -> MissingSignature
//! RECEIVE_RAW -> COMPUTE_DIGEST -> COMPARE -> PARSE -> ACCEPT
//!                                     \-> InvalidSignature
//! PARSE -> (not JSON) -> MalformedPayload
//! ```
//!
//! # Overview
//!
//! - [`WebhookEnvelope`]: The delivery as received (raw body plus headers)
//! - [`VerifiedWebhook`]: The trusted result handed to downstream consumers
//! - [`WebhookVerifier`]: Verifies envelopes against the configured secret
//! - [`WebhookError`]: Rejection reasons
//!
//! # Thread Safety
//!
//! All types in this module are `Send + Sync`, and verification holds no
//! state between calls, so identical deliveries always verify identically.

mod errors;
mod verification;

pub use errors::WebhookError;
pub use verification::{
    verify_hmac, verify_payload, verify_webhook, VerifiedWebhook, WebhookEnvelope,
    WebhookVerifier, HEADER_API_VERSION, HEADER_HMAC, HEADER_SHOP_DOMAIN, HEADER_TOPIC,
    HEADER_WEBHOOK_ID,
};
