//! Credentials minted by a completed authorization.

use crate::auth::AuthScopes;
use crate::config::ShopDomain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An offline Admin API access token.
///
/// # Security
///
/// The `Debug` implementation masks the token. Use [`AccessToken::expose`]
/// only when the value has to leave the process (the Admin API header or the
/// downstream store).
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(*****)")
    }
}

/// The result of a successful token exchange.
///
/// An `AccessCredential` is only ever produced fully populated; a failed
/// exchange yields an error and no credential. Persisting it is the caller's
/// job (see [`crate::downstream::DownstreamClient::save_connection`]).
///
/// # Thread Safety
///
/// `AccessCredential` is `Send + Sync`.
#[derive(Clone, Debug)]
pub struct AccessCredential {
    /// The shop the token grants access to.
    pub shop: ShopDomain,

    /// The access token.
    pub access_token: AccessToken,

    /// The scopes the merchant actually granted.
    pub scopes: AuthScopes,

    /// When the exchange completed.
    pub obtained_at: DateTime<Utc>,

    /// The correlation id (brand id) the authorization was started for.
    pub correlation_id: String,
}

impl AccessCredential {
    /// Creates a credential obtained now.
    #[must_use]
    pub fn new(
        shop: ShopDomain,
        access_token: AccessToken,
        scopes: AuthScopes,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            shop,
            access_token,
            scopes,
            obtained_at: Utc::now(),
            correlation_id: correlation_id.into(),
        }
    }

    /// Returns the payload handed to the downstream store.
    ///
    /// This is the only representation that carries the raw token.
    #[must_use]
    pub fn to_connection_record(&self) -> ConnectionRecord<'_> {
        ConnectionRecord {
            brand_id: &self.correlation_id,
            shop: &self.shop,
            access_token: self.access_token.expose(),
            scope: self.scopes.to_string(),
        }
    }
}

/// Wire form of a credential sent to the downstream store.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord<'a> {
    /// Correlation id the install was started for.
    pub brand_id: &'a str,
    /// Shop domain.
    pub shop: &'a ShopDomain,
    /// Raw access token.
    pub access_token: &'a str,
    /// Granted scopes, comma-joined.
    pub scope: String,
}

// Verify AccessCredential is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AccessCredential>();
};
