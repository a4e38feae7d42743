use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a prepared request. Wrappers layer authentication on top of an
/// inner client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> Result<Response>;
}
