//! HMAC-SHA256 signing and constant-time comparison.
//!
//! Used to sign OAuth state tokens and to verify webhook deliveries.
//!
//! # Example
//!
//! ```rust
//! use shopify_bridge::auth::oauth::hmac::{compute_signature_base64, constant_time_eq};
//!
//! let sig = compute_signature_base64(b"webhook payload", b"secret");
//! assert_eq!(sig.len(), 44); // Base64 of 32 bytes
//! assert!(constant_time_eq(sig.as_bytes(), sig.as_bytes()));
//! ```

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Computes the raw 32-byte HMAC-SHA256 of `message` under `secret`.
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_signature(message: &[u8], secret: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message);
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    digest
}

/// Computes the HMAC-SHA256 of `message` as standard (padded) base64.
///
/// This is the text encoding Shopify puts in the `X-Shopify-Hmac-SHA256`
/// header. `message` is raw bytes so that the exact webhook body is signed
/// without any UTF-8 or JSON interpretation.
///
/// # Example
///
/// ```rust
/// use shopify_bridge::auth::oauth::hmac::compute_signature_base64;
///
/// let sig = compute_signature_base64(b"message", b"key");
/// assert_eq!(sig, "bp7ym3X//Ft6uuUn1Y/a2y/kLnIZARl2kXNDBl9Y7Uo=");
/// ```
#[must_use]
pub fn compute_signature_base64(message: &[u8], secret: &[u8]) -> String {
    BASE64_STANDARD.encode(compute_signature(message, secret))
}

/// Compares two byte strings without leaking where they differ.
///
/// Inputs of different length are unequal; the length check happens first
/// and only equal-length inputs go through the constant-time path.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
