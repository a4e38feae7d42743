mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::Result;
use serde::de::DeserializeOwned;

/// Sends `req` and decodes a JSON body, turning non-2xx statuses into errors
/// that carry the response body.
pub async fn send_json<C, T>(client: &C, req: reqwest::Request) -> Result<T>
where
    C: HttpClient + ?Sized,
    T: DeserializeOwned,
{
    let method = req.method().clone();
    let url = req.url().clone();

    let response = client.execute(req).await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!(
            "{} {} returned status {}: {}",
            method,
            url.path(),
            status,
            body
        ));
    }

    response
        .json()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to parse response from {}: {}", url.path(), e))
}
