//! Fawwerty HTTP client
//!
//! Authenticated transport for the REST backend. Requests outside the auth
//! namespace carry the bearer token and get one refresh-and-retry on 401.

#[macro_use]
extern crate tracing;

pub mod auth_payload;
pub mod client;
pub mod types;

pub use auth_payload::AuthPayload;
pub use client::error::ClientError;
pub use client::{ApiClient, ApiClientBuilder, RequestOptions};
