use anyhow::{Context, Result};

use super::KeyStore;

/// Reads secrets from environment variables. `.env` is expected to have been
/// loaded already.
pub struct EnvKeyStore;

#[async_trait::async_trait]
impl KeyStore for EnvKeyStore {
    async fn get(&self, reference: &str) -> Result<String> {
        let value = std::env::var(reference)
            .with_context(|| format!("environment variable '{reference}' is not set"))?;
        if value.trim().is_empty() {
            anyhow::bail!("environment variable '{reference}' is empty");
        }
        Ok(value)
    }
}

/// Reads secrets from files on disk.
pub struct FileKeyStore;

#[async_trait::async_trait]
impl KeyStore for FileKeyStore {
    async fn get(&self, reference: &str) -> Result<String> {
        tokio::fs::read_to_string(reference)
            .await
            .with_context(|| format!("failed to read secret file '{reference}'"))
    }
}
