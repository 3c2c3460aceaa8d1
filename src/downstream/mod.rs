//! Calls to the application backend that owns shop connections.
//!
//! The bridge never stores credentials itself. After a successful install it
//! hands the credential to the downstream store, forwards verified webhooks
//! there, and asks it for a brand's store when it needs to act on a shop.
//!
//! # Overview
//!
//! - [`DownstreamClient`]: The HTTP client for all four endpoints
//! - [`StoreRecord`]: A brand's connected store
//! - [`DownstreamError`]: Errors from downstream calls

mod client;
mod errors;

pub use client::{DownstreamClient, StoreRecord, PING_SOURCE};
pub use errors::DownstreamError;
