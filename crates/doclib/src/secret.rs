use serde::{Deserialize, Serialize};

use crate::record::{Credential, Secret};

/// Where to find a secret in an external vault.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SecretRef {
    /// Name of the secret inside the vault (or environment variable name).
    pub name: String,
    /// Key used to unlock the vault, e.g. a private key path.
    #[serde(default)]
    pub key_reference: Option<String>,
    /// The vault itself, e.g. an encrypted file path.
    #[serde(default)]
    pub vault_reference: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret {0:?} not found")]
    NotFound(String),

    #[error("secret provider failed: {0}")]
    Provider(String),
}

/// Yields secrets on demand. The vault behind it is opaque.
#[async_trait::async_trait]
pub trait SecretProvider: Send + Sync {
    async fn get_secret(&self, reference: &SecretRef) -> Result<Secret, SecretError>;
}

/// Domain, username and the vault location of the password.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialRef {
    #[serde(default)]
    pub domain: String,
    pub username: String,
    pub secret: SecretRef,
}

impl CredentialRef {
    /// Look up the password and assemble a usable credential.
    pub async fn resolve(&self, provider: &dyn SecretProvider) -> Result<Credential, SecretError> {
        let secret = provider.get_secret(&self.secret).await?;
        Ok(Credential::new(&self.domain, &self.username, secret))
    }
}
