//! Request authentication for the warehouse API.
//!
//! [`TokenSource`] hands out OAuth2 access tokens, [`ServiceAccountTokens`]
//! mints them from a service-account key and [`BearerAuth`] wraps any
//! [`HttpClient`](crate::fetch::HttpClient) to attach them.

mod bearer;
mod service_account;

pub use bearer::BearerAuth;
pub use service_account::{ServiceAccountKey, ServiceAccountTokens};

use anyhow::Result;

/// Produces a currently valid OAuth2 access token.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}
