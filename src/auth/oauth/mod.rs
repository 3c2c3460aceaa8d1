//! OAuth 2.0 authorization code flow for installing the app on a shop.
//!
//! 1. **Authorization Initiation** ([`begin_auth`]): Mint a signed state token
//!    and build the URL the merchant is redirected to.
//!
//! 2. **Callback Completion** ([`complete_callback`]): Verify the state, then
//!    exchange the one-time code for an offline access token.
//!
//! # Security Features
//!
//! - **CSRF Protection**: The state is an HMAC-signed token bound to the shop
//!   and correlation id; it cannot be forged without the client secret
//! - **Single Use**: Each state nonce is consumed through a [`StateStore`]
//! - **Constant-Time Comparison**: Signatures are compared with [`subtle`]
//! - **No Secret Leakage**: The client secret is redacted from
//!   [`OAuthError::TokenExchangeFailed`] messages
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_bridge::auth::oauth::{begin_auth, complete_callback, CallbackQuery, InMemoryStateStore};
//!
//! let redirect = begin_auth(&config, "my-store", "brand-1", config.scopes(), &host)?;
//! // 302 to redirect.auth_url ...
//!
//! let store = InMemoryStateStore::new();
//! let credential = complete_callback(&config, &query, &store).await?;
//! ```

mod begin_auth;
mod callback;
mod error;
pub mod hmac;
mod state;

pub use begin_auth::{begin_auth, begin_auth_with_config_defaults, BeginAuthResult};
pub use callback::{complete_callback, complete_callback_with_client, CallbackQuery};
pub use error::OAuthError;
pub use state::{InMemoryStateStore, StateClaims, StateRejection, StateStore, StateToken};
