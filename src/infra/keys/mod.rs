//! Service-account credential loading.
//!
//! [`SecretRef`] names where the credential payload lives.
//! [`KeyStore`] is the async trait for resolving a location into its plaintext value,
//! implemented by [`EnvKeyStore`], [`FileKeyStore`] and [`SsmKeyStore`].

mod config;
mod local;
mod ssm;

pub use config::SecretRef;
pub use local::{EnvKeyStore, FileKeyStore};
pub use ssm::SsmKeyStore;

use crate::fetch::auth::ServiceAccountKey;
use anyhow::{Context, Result};
use tracing::info;

/// Resolves a location (variable name, file path, SSM parameter path) into a
/// plaintext secret.
#[async_trait::async_trait]
pub trait KeyStore: Send + Sync {
    async fn get(&self, reference: &str) -> Result<String>;
}

/// Fetches the raw secret named by `reference` from the matching store.
pub async fn resolve_secret(reference: &SecretRef) -> Result<String> {
    match reference {
        SecretRef::Env(name) => EnvKeyStore.get(name).await,
        SecretRef::File(path) => FileKeyStore.get(path).await,
        SecretRef::Ssm(path) => SsmKeyStore::from_env().await.get(path).await,
    }
}

/// Loads and validates the service-account key named by `reference`.
#[tracing::instrument(fields(reference = %reference))]
pub async fn load_service_account(reference: &SecretRef) -> Result<ServiceAccountKey> {
    let payload = resolve_secret(reference)
        .await
        .with_context(|| format!("no service-account credentials at '{reference}'"))?;

    let key = ServiceAccountKey::from_json(&payload)
        .with_context(|| format!("invalid service-account credentials at '{reference}'"))?;

    info!(client_email = %key.client_email, "Service-account credentials loaded");
    Ok(key)
}
