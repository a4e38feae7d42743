use anyhow::Result;
use std::fmt;
use std::str::FromStr;

/// Where a secret lives, written as `<scheme>:<location>`:
///
/// - `env:GCP_SERVICE_ACCOUNT`: an environment variable (after `.env` loading)
/// - `file:/etc/dashboard/key.json`: a file on disk
/// - `ssm:/fundao/gcp_service_account`: an AWS SSM parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretRef {
    Env(String),
    File(String),
    Ssm(String),
}

impl SecretRef {
    /// The part after the scheme.
    pub fn location(&self) -> &str {
        match self {
            SecretRef::Env(name) => name,
            SecretRef::File(path) => path,
            SecretRef::Ssm(path) => path,
        }
    }
}

impl FromStr for SecretRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (scheme, location) = s
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("secret reference '{s}' has no scheme"))?;

        let location = location.trim();
        if location.is_empty() {
            anyhow::bail!("secret reference '{s}' has an empty location");
        }

        match scheme.trim().to_ascii_lowercase().as_str() {
            "env" => Ok(SecretRef::Env(location.to_string())),
            "file" => Ok(SecretRef::File(location.to_string())),
            "ssm" => Ok(SecretRef::Ssm(location.to_string())),
            other => anyhow::bail!("unsupported secret scheme '{other}'"),
        }
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretRef::Env(name) => write!(f, "env:{name}"),
            SecretRef::File(path) => write!(f, "file:{path}"),
            SecretRef::Ssm(path) => write!(f, "ssm:{path}"),
        }
    }
}
