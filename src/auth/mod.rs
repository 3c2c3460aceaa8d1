//! Authorization types.
//!
//! # Overview
//!
//! - [`AuthScopes`]: A set of OAuth scopes with implied scope handling
//! - [`AccessCredential`]: The credential minted by a completed install
//! - [`AccessToken`]: An access token that never shows up in `Debug` output
//! - [`oauth`]: The authorization code flow
//!
//! # Example
//!
//! ```rust
//! use shopify_bridge::{AccessCredential, AccessToken, ShopDomain};
//!
//! let credential = AccessCredential::new(
//!     ShopDomain::new("my-store").unwrap(),
//!     AccessToken::new("shpat_123"),
//!     "read_orders".parse().unwrap(),
//!     "brand-1",
//! );
//! assert_eq!(credential.access_token.expose(), "shpat_123");
//! ```

mod credential;
pub mod oauth;
mod scopes;

pub use credential::{AccessCredential, AccessToken, ConnectionRecord};
pub use scopes::AuthScopes;
