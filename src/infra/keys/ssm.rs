use anyhow::{Context, Result};
use tracing::debug;

use super::KeyStore;

/// Reads the service-account payload from AWS SSM Parameter Store.
///
/// The key is usually stored as a `SecureString`, so lookups always ask for
/// decryption; the caller needs `ssm:GetParameter` plus `kms:Decrypt` on the
/// parameter's key.
pub struct SsmKeyStore {
    client: aws_sdk_ssm::Client,
}

impl SsmKeyStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_ssm::Client::new(config),
        }
    }

    /// Uses whatever AWS configuration the environment provides.
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        debug!(region = ?config.region(), "AWS configuration loaded");
        Self::new(&config)
    }
}

#[async_trait::async_trait]
impl KeyStore for SsmKeyStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, reference: &str) -> Result<String> {
        let output = self
            .client
            .get_parameter()
            .name(reference)
            .with_decryption(true)
            .send()
            .await
            .with_context(|| format!("could not read SSM parameter '{reference}'"))?;

        let parameter = output
            .parameter()
            .with_context(|| format!("SSM returned no parameter for '{reference}'"))?;
        debug!(version = parameter.version(), "SSM parameter read");

        match parameter.value() {
            Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
            _ => anyhow::bail!("SSM parameter '{reference}' is empty"),
        }
    }
}
