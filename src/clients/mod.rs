//! Outbound HTTP plumbing.
//!
//! # Overview
//!
//! - [`AdminClient`]: Authenticated client for one shop's Admin API
//! - [`HttpResponse`]: A parsed response from the API
//! - [`HttpError`]: Errors from Admin API calls
//! - [`build_reqwest_client`]: The reqwest client every outbound call uses
//!
//! Every call is made once. Retrying is left to the caller, because the
//! calls this crate makes (code exchange, resource creation) are not safe to
//! repeat blindly.

mod errors;
mod http_client;
mod http_response;

pub use errors::{HttpError, HttpResponseError};
pub use http_client::{build_reqwest_client, user_agent, AdminClient, BRIDGE_VERSION};
pub use http_response::HttpResponse;
