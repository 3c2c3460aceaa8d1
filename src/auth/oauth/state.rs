//! Signed, single-use OAuth state tokens.
//!
//! The `state` parameter round-trips through the merchant's browser, so it
//! must be unforgeable and bound to the request that minted it. A
//! [`StateToken`] is self-verifying:
//!
//! ```text
//! base64url(json{cid, shop, iat, nonce}) "." base64url(HMAC-SHA256(client_secret, <first part>))
//! ```
//!
//! At callback time the MAC is checked in constant time, then the shop, the
//! age and (through a [`StateStore`]) single use of the nonce.
//!
//! # Example
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use shopify_bridge::auth::oauth::StateToken;
//! use shopify_bridge::{ApiSecretKey, ShopDomain};
//!
//! let secret = ApiSecretKey::new("secret").unwrap();
//! let shop = ShopDomain::new("my-store").unwrap();
//! let now = Utc::now();
//!
//! let token = StateToken::mint(&secret, "brand-1", &shop, now);
//! let claims = StateToken::verify(&secret, token.as_ref(), &shop, Duration::minutes(10), now).unwrap();
//! assert_eq!(claims.correlation_id, "brand-1");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use base64::prelude::*;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::oauth::hmac::{compute_signature, constant_time_eq};
use crate::config::{ApiSecretKey, ShopDomain};

/// How far in the future an `iat` may be before the token is rejected.
const CLOCK_SKEW_SECS: i64 = 60;

/// Why a state value was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateRejection {
    /// Not a `payload.signature` pair, or a part failed to decode.
    #[error("state is malformed")]
    Malformed,

    /// The signature does not match the payload.
    #[error("state signature does not match")]
    BadSignature,

    /// The state was minted for a different shop.
    #[error("state was issued for a different shop")]
    ShopMismatch,

    /// The state is older than the configured lifetime.
    #[error("state has expired")]
    Expired,

    /// The state claims to be issued in the future.
    #[error("state was issued in the future")]
    IssuedInFuture,

    /// The state's nonce was already consumed.
    #[error("state was already used")]
    Replayed,
}

/// The verified contents of a state token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateClaims {
    /// The correlation id (brand id) the authorization was started for.
    pub correlation_id: String,
    /// The shop domain the token was minted for.
    pub shop: String,
    /// When the token was minted.
    pub issued_at: DateTime<Utc>,
    /// 15-character random nonce.
    pub nonce: String,
}

#[derive(Serialize, Deserialize)]
struct StatePayload {
    cid: String,
    shop: String,
    iat: i64,
    nonce: String,
}

/// A minted OAuth state token.
///
/// # Thread Safety
///
/// `StateToken` is `Send + Sync`, making it safe to share across threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateToken {
    value: String,
    claims: StateClaims,
}

// Verify StateToken is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StateToken>();
};

impl StateToken {
    /// The length of generated nonces.
    const NONCE_LENGTH: usize = 15;

    /// Mints a state token bound to `correlation_id` and `shop`.
    #[must_use]
    pub fn mint(
        secret: &ApiSecretKey,
        correlation_id: &str,
        shop: &ShopDomain,
        now: DateTime<Utc>,
    ) -> Self {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::NONCE_LENGTH)
            .map(char::from)
            .collect();

        let payload = StatePayload {
            cid: correlation_id.to_string(),
            shop: shop.as_ref().to_string(),
            iat: now.timestamp(),
            nonce,
        };
        let json = serde_json::to_string(&payload).unwrap_or_default();
        let encoded_payload = BASE64_URL_SAFE_NO_PAD.encode(json.as_bytes());
        let signature = compute_signature(encoded_payload.as_bytes(), secret.as_bytes());
        let value = format!(
            "{encoded_payload}.{}",
            BASE64_URL_SAFE_NO_PAD.encode(signature)
        );

        Self {
            value,
            claims: StateClaims {
                correlation_id: payload.cid,
                shop: payload.shop,
                issued_at: Utc.timestamp_opt(payload.iat, 0).single().unwrap_or(now),
                nonce: payload.nonce,
            },
        }
    }

    /// Verifies a raw state value received on the callback.
    ///
    /// This checks the signature and freshness only; single use is enforced
    /// separately through a [`StateStore`].
    ///
    /// # Errors
    ///
    /// Returns a [`StateRejection`] naming the first check that failed.
    pub fn verify(
        secret: &ApiSecretKey,
        raw: &str,
        shop: &ShopDomain,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<StateClaims, StateRejection> {
        let (encoded_payload, encoded_signature) =
            raw.split_once('.').ok_or(StateRejection::Malformed)?;
        let signature = BASE64_URL_SAFE_NO_PAD
            .decode(encoded_signature)
            .map_err(|_| StateRejection::Malformed)?;

        let expected = compute_signature(encoded_payload.as_bytes(), secret.as_bytes());
        if !constant_time_eq(&expected, &signature) {
            return Err(StateRejection::BadSignature);
        }

        let json = BASE64_URL_SAFE_NO_PAD
            .decode(encoded_payload)
            .map_err(|_| StateRejection::Malformed)?;
        let payload: StatePayload =
            serde_json::from_slice(&json).map_err(|_| StateRejection::Malformed)?;

        if payload.shop != shop.as_ref() {
            return Err(StateRejection::ShopMismatch);
        }

        let issued_at = Utc
            .timestamp_opt(payload.iat, 0)
            .single()
            .ok_or(StateRejection::Malformed)?;
        if issued_at > now + Duration::seconds(CLOCK_SKEW_SECS) {
            return Err(StateRejection::IssuedInFuture);
        }
        if now - issued_at > ttl {
            return Err(StateRejection::Expired);
        }

        Ok(StateClaims {
            correlation_id: payload.cid,
            shop: payload.shop,
            issued_at,
            nonce: payload.nonce,
        })
    }

    /// Returns the claims this token was minted with.
    #[must_use]
    pub const fn claims(&self) -> &StateClaims {
        &self.claims
    }
}

impl fmt::Display for StateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for StateToken {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

/// Records consumed state nonces so each state is accepted at most once.
///
/// Implementations must be safe to call concurrently; of two racing calls
/// with the same nonce, exactly one returns `true`.
pub trait StateStore: Send + Sync {
    /// Marks `nonce` as used until `expires_at`.
    ///
    /// Returns `false` if the nonce had already been consumed.
    fn consume(&self, nonce: &str, expires_at: DateTime<Utc>) -> bool;
}

/// Process-local [`StateStore`].
///
/// Entries are pruned once their expiry has passed, which is safe because an
/// expired state fails verification anyway.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    consumed: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nonces currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.consumed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no nonces are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateStore for InMemoryStateStore {
    fn consume(&self, nonce: &str, expires_at: DateTime<Utc>) -> bool {
        let mut consumed = self
            .consumed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let now = Utc::now();
        consumed.retain(|_, expiry| *expiry > now);

        if consumed.contains_key(nonce) {
            return false;
        }
        consumed.insert(nonce.to_string(), expires_at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> ApiSecretKey {
        ApiSecretKey::new("test-secret").unwrap()
    }

    fn shop() -> ShopDomain {
        ShopDomain::new("my-store").unwrap()
    }

    fn ttl() -> Duration {
        Duration::minutes(10)
    }

    #[test]
    fn test_mint_generates_15_char_alphanumeric_nonce() {
        let token = StateToken::mint(&secret(), "brand-1", &shop(), Utc::now());
        let nonce = &token.claims().nonce;
        assert_eq!(nonce.len(), 15);
        assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_mint_generates_unique_tokens() {
        let now = Utc::now();
        let a = StateToken::mint(&secret(), "brand-1", &shop(), now);
        let b = StateToken::mint(&secret(), "brand-1", &shop(), now);
        assert_ne!(a.as_ref(), b.as_ref());
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = StateToken::mint(&secret(), "brand/with+chars", &shop(), Utc::now());
        assert!(token
            .as_ref()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'));
    }

    #[test]
    fn test_verify_round_trips_claims() {
        let now = Utc::now();
        let token = StateToken::mint(&secret(), "brand-1", &shop(), now);
        let claims = StateToken::verify(&secret(), token.as_ref(), &shop(), ttl(), now).unwrap();
        assert_eq!(&claims, token.claims());
        assert_eq!(claims.shop, "my-store.myshopify.com");
    }

    #[test]
    fn test_verify_rejects_other_secret() {
        let now = Utc::now();
        let token = StateToken::mint(&secret(), "brand-1", &shop(), now);
        let other = ApiSecretKey::new("other-secret").unwrap();
        assert_eq!(
            StateToken::verify(&other, token.as_ref(), &shop(), ttl(), now),
            Err(StateRejection::BadSignature)
        );
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let now = Utc::now();
        let token = StateToken::mint(&secret(), "brand-1", &shop(), now);
        let (_, signature) = token.as_ref().split_once('.').unwrap();

        let forged = BASE64_URL_SAFE_NO_PAD.encode(
            br#"{"cid":"brand-2","shop":"my-store.myshopify.com","iat":0,"nonce":"x"}"#,
        );
        let raw = format!("{forged}.{signature}");
        assert_eq!(
            StateToken::verify(&secret(), &raw, &shop(), ttl(), now),
            Err(StateRejection::BadSignature)
        );
    }

    #[test]
    fn test_verify_rejects_malformed_values() {
        let now = Utc::now();
        for raw in ["", "no-dot", "a.b.c", "abc.!!!", "."] {
            let result = StateToken::verify(&secret(), raw, &shop(), ttl(), now);
            assert!(
                matches!(
                    result,
                    Err(StateRejection::Malformed | StateRejection::BadSignature)
                ),
                "{raw:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_verify_rejects_foreign_shop() {
        let now = Utc::now();
        let token = StateToken::mint(&secret(), "brand-1", &shop(), now);
        let other_shop = ShopDomain::new("other-store").unwrap();
        assert_eq!(
            StateToken::verify(&secret(), token.as_ref(), &other_shop, ttl(), now),
            Err(StateRejection::ShopMismatch)
        );
    }

    #[test]
    fn test_verify_enforces_lifetime() {
        let minted_at = Utc::now();
        let token = StateToken::mint(&secret(), "brand-1", &shop(), minted_at);

        let later = minted_at + Duration::minutes(11);
        assert_eq!(
            StateToken::verify(&secret(), token.as_ref(), &shop(), ttl(), later),
            Err(StateRejection::Expired)
        );

        let earlier = minted_at - Duration::minutes(5);
        assert_eq!(
            StateToken::verify(&secret(), token.as_ref(), &shop(), ttl(), earlier),
            Err(StateRejection::IssuedInFuture)
        );

        let within_skew = minted_at - Duration::seconds(30);
        assert!(StateToken::verify(&secret(), token.as_ref(), &shop(), ttl(), within_skew).is_ok());
    }

    #[test]
    fn test_in_memory_store_consumes_once() {
        let store = InMemoryStateStore::new();
        let expires = Utc::now() + Duration::minutes(10);

        assert!(store.consume("nonce-1", expires));
        assert!(!store.consume("nonce-1", expires));
        assert!(store.consume("nonce-2", expires));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_in_memory_store_prunes_expired_entries() {
        let store = InMemoryStateStore::new();
        assert!(store.consume("old", Utc::now() - Duration::seconds(1)));
        assert!(store.consume("new", Utc::now() + Duration::minutes(1)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_state_store_is_object_safe() {
        let store: Box<dyn StateStore> = Box::new(InMemoryStateStore::new());
        assert!(store.consume("n", Utc::now() + Duration::minutes(1)));
    }
}
