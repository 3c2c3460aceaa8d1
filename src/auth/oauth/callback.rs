//! OAuth callback handling and token exchange.
//!
//! After the merchant approves the install, Shopify redirects to the callback
//! with `shop`, `code` and `state`. [`complete_callback`] then:
//!
//! 1. Requires all three parameters
//! 2. Validates the shop domain
//! 3. Verifies the state token and consumes its nonce
//! 4. POSTs the code to the shop's token endpoint, exactly once
//! 5. Returns a fully populated [`AccessCredential`]
//!
//! The code is single use on Shopify's side, so a failed exchange is never
//! retried; the merchant has to start a new authorization.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::oauth::error::OAuthError;
use crate::auth::oauth::state::{StateStore, StateToken};
use crate::auth::{AccessCredential, AccessToken, AuthScopes};
use crate::clients::build_reqwest_client;
use crate::config::BridgeConfig;

/// Query parameters of the OAuth callback.
///
/// Every field is optional so that a missing value surfaces as
/// [`OAuthError::MissingParameter`] instead of a generic extractor
/// rejection. Extra parameters Shopify appends (`hmac`, `host`,
/// `timestamp`) are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallbackQuery {
    /// The shop domain.
    pub shop: Option<String>,
    /// The one-time authorization code.
    pub code: Option<String>,
    /// The state token minted by `begin_auth`.
    pub state: Option<String>,
}

impl CallbackQuery {
    /// Creates a query with all three parameters present.
    #[must_use]
    pub fn new(
        shop: impl Into<String>,
        code: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            shop: Some(shop.into()),
            code: Some(code.into()),
            state: Some(state.into()),
        }
    }
}

#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct TokenExchangeResponse {
    access_token: Option<String>,
    scope: Option<String>,
}

fn required<'a>(value: Option<&'a String>, name: &'static str) -> Result<&'a str, OAuthError> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or(OAuthError::MissingParameter { name })
}

/// Validates an OAuth callback and exchanges the code for an access token.
///
/// The state's nonce is consumed in `state_store` before the exchange, so a
/// replayed callback is rejected even if the first one is still in flight.
///
/// # Errors
///
/// - [`OAuthError::MissingParameter`]: `shop`, `code` or `state` is absent or empty
/// - [`OAuthError::InvalidShopDomain`]: the shop is not under the platform suffix
/// - [`OAuthError::InvalidState`]: the state is forged, foreign, expired or replayed
/// - [`OAuthError::TokenExchangeFailed`]: network failure, non-2xx status, or a
///   response without an `access_token`
/// - [`OAuthError::Misconfigured`]: the HTTP client could not be built, or the
///   state lifetime does not fit in a timestamp
///
/// # Example
///
/// ```rust,ignore
/// use shopify_bridge::auth::oauth::{complete_callback, CallbackQuery, InMemoryStateStore};
///
/// let store = InMemoryStateStore::new();
/// let query = CallbackQuery::new("my-store.myshopify.com", code, state);
/// let credential = complete_callback(&config, &query, &store).await?;
/// println!("Connected {}", credential.shop);
/// ```
pub async fn complete_callback(
    config: &BridgeConfig,
    query: &CallbackQuery,
    state_store: &dyn StateStore,
) -> Result<AccessCredential, OAuthError> {
    let http = build_reqwest_client(config).map_err(|e| OAuthError::Misconfigured {
        reason: format!("HTTP client: {e}"),
    })?;
    complete_callback_with_client(config, &http, query, state_store).await
}

/// Same as [`complete_callback`], but sends the token exchange through an
/// existing reqwest client so its connection pool is reused.
///
/// # Errors
///
/// See [`complete_callback`].
pub async fn complete_callback_with_client(
    config: &BridgeConfig,
    http: &reqwest::Client,
    query: &CallbackQuery,
    state_store: &dyn StateStore,
) -> Result<AccessCredential, OAuthError> {
    let shop = required(query.shop.as_ref(), "shop")?;
    let code = required(query.code.as_ref(), "code")?;
    let state = required(query.state.as_ref(), "state")?;

    let shop = config.parse_shop(shop)?;

    let claims = StateToken::verify(
        config.api_secret_key(),
        state,
        &shop,
        config.state_ttl(),
        Utc::now(),
    )
    .map_err(|rejection| {
        tracing::warn!(shop = %shop, reason = %rejection, "rejected OAuth callback state");
        OAuthError::InvalidState {
            reason: rejection.to_string(),
        }
    })?;

    let expires_at = claims
        .issued_at
        .checked_add_signed(config.state_ttl())
        .ok_or_else(|| OAuthError::Misconfigured {
            reason: "state lifetime overflows the token timestamp".to_string(),
        })?;

    if !state_store.consume(&claims.nonce, expires_at) {
        tracing::warn!(shop = %shop, "rejected replayed OAuth callback state");
        return Err(OAuthError::InvalidState {
            reason: "state was already used".to_string(),
        });
    }

    let token_url = format!("{}/admin/oauth/access_token", config.shop_origin(&shop));
    let secret = config.api_secret_key().as_ref();
    let redact = |message: String| message.replace(secret, "[REDACTED]");

    let request_body = TokenExchangeRequest {
        client_id: config.api_key().as_ref(),
        client_secret: secret,
        code,
    };

    let response = http
        .post(&token_url)
        .json(&request_body)
        .send()
        .await
        .map_err(|e| OAuthError::TokenExchangeFailed {
            status: 0,
            message: redact(format!("Network error: {e}")),
        })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| OAuthError::TokenExchangeFailed {
            status: status.as_u16(),
            message: redact(format!("Failed to read token response: {e}")),
        })?;

    if !status.is_success() {
        tracing::warn!(shop = %shop, status = status.as_u16(), "token exchange rejected");
        return Err(OAuthError::TokenExchangeFailed {
            status: status.as_u16(),
            message: redact(body),
        });
    }

    let parsed: TokenExchangeResponse =
        serde_json::from_str(&body).map_err(|e| OAuthError::TokenExchangeFailed {
            status: status.as_u16(),
            message: redact(format!("Failed to parse token response: {e}")),
        })?;

    let Some(access_token) = parsed.access_token.filter(|token| !token.is_empty()) else {
        tracing::warn!(shop = %shop, "token response did not contain an access token");
        return Err(OAuthError::TokenExchangeFailed {
            status: status.as_u16(),
            message: redact(body),
        });
    };

    let scopes = AuthScopes::requested(parsed.scope.as_deref().unwrap_or_default()).map_err(
        |e| OAuthError::TokenExchangeFailed {
            status: status.as_u16(),
            message: format!("Unexpected scope in token response: {e}"),
        },
    )?;

    tracing::info!(shop = %shop, scope = %scopes, "completed OAuth token exchange");

    Ok(AccessCredential::new(
        shop,
        AccessToken::new(access_token),
        scopes,
        claims.correlation_id,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oauth::state::InMemoryStateStore;
    use crate::config::{ApiKey, ApiSecretKey, ShopDomain};

    fn create_test_config() -> BridgeConfig {
        BridgeConfig::builder()
            .api_key(ApiKey::new("test-api-key").unwrap())
            .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
            .build()
            .unwrap()
    }

    fn minted_state(config: &BridgeConfig, shop: &str) -> String {
        let shop = ShopDomain::new(shop).unwrap();
        StateToken::mint(config.api_secret_key(), "brand-1", &shop, Utc::now()).to_string()
    }

    #[tokio::test]
    async fn test_complete_callback_requires_parameters() {
        let config = create_test_config();
        let store = InMemoryStateStore::new();

        let query = CallbackQuery {
            shop: None,
            code: Some("code".to_string()),
            state: Some("state".to_string()),
        };
        let result = complete_callback(&config, &query, &store).await;
        assert_eq!(
            result.unwrap_err(),
            OAuthError::MissingParameter { name: "shop" }
        );

        let query = CallbackQuery {
            shop: Some("test-shop".to_string()),
            code: Some(String::new()),
            state: Some("state".to_string()),
        };
        let result = complete_callback(&config, &query, &store).await;
        assert_eq!(
            result.unwrap_err(),
            OAuthError::MissingParameter { name: "code" }
        );

        let query = CallbackQuery {
            shop: Some("test-shop".to_string()),
            code: Some("code".to_string()),
            state: None,
        };
        let result = complete_callback(&config, &query, &store).await;
        assert_eq!(
            result.unwrap_err(),
            OAuthError::MissingParameter { name: "state" }
        );
    }

    #[tokio::test]
    async fn test_complete_callback_rejects_invalid_shop() {
        let config = create_test_config();
        let store = InMemoryStateStore::new();
        let query = CallbackQuery::new("invalid shop domain", "code", "state");

        let result = complete_callback(&config, &query, &store).await;
        assert!(matches!(result, Err(OAuthError::InvalidShopDomain { .. })));
    }

    #[tokio::test]
    async fn test_complete_callback_rejects_unbound_state() {
        let config = create_test_config();
        let store = InMemoryStateStore::new();
        let query = CallbackQuery::new("test-shop", "valid-code", "made-up-state");

        let result = complete_callback(&config, &query, &store).await;
        assert!(matches!(result, Err(OAuthError::InvalidState { .. })));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_complete_callback_rejects_replayed_state_before_exchange() {
        let config = create_test_config();
        let store = InMemoryStateStore::new();
        let state = minted_state(&config, "test-shop");

        let claims = StateToken::verify(
            config.api_secret_key(),
            &state,
            &ShopDomain::new("test-shop").unwrap(),
            config.state_ttl(),
            Utc::now(),
        )
        .unwrap();
        assert!(store.consume(&claims.nonce, Utc::now() + config.state_ttl()));

        let query = CallbackQuery::new("test-shop", "code", state);
        let result = complete_callback(&config, &query, &store).await;
        assert_eq!(
            result.unwrap_err(),
            OAuthError::InvalidState {
                reason: "state was already used".to_string()
            }
        );
    }

    #[test]
    fn test_callback_query_deserializes_and_ignores_extra_fields() {
        let query: CallbackQuery = serde_json::from_value(serde_json::json!({
            "shop": "test-shop.myshopify.com",
            "code": "abc",
            "state": "s",
            "hmac": "ignored",
            "timestamp": "1700000000"
        }))
        .unwrap();
        assert_eq!(query.shop.as_deref(), Some("test-shop.myshopify.com"));
        assert_eq!(query.code.as_deref(), Some("abc"));
    }
}
