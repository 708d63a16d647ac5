use anyhow::{Context, Result};
use doclib::{Credential, Secret, SecretError, SecretProvider, SecretRef};

use crate::config::{AppConfig, CredentialEntry, ProviderKind};

/// Reads the password from the environment variable named by the secret.
pub struct EnvSecretProvider;

#[async_trait::async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn get_secret(&self, reference: &SecretRef) -> Result<Secret, SecretError> {
        match std::env::var(&reference.name) {
            Ok(value) if !value.is_empty() => Ok(Secret::new(value)),
            _ => Err(SecretError::NotFound(reference.name.clone())),
        }
    }
}

/// Runs an external vault helper and reads the password from its stdout.
///
/// Invoked as `program [args..] name [key_reference] [vault_reference]`.
pub struct CommandSecretProvider {
    program: String,
    args: Vec<String>,
}

impl CommandSecretProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait::async_trait]
impl SecretProvider for CommandSecretProvider {
    async fn get_secret(&self, reference: &SecretRef) -> Result<Secret, SecretError> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args).arg(&reference.name);
        if let Some(key) = &reference.key_reference {
            cmd.arg(key);
        }
        if let Some(vault) = &reference.vault_reference {
            cmd.arg(vault);
        }

        tracing::debug!(program = %self.program, secret = %reference.name, "running secret helper");

        let output = cmd
            .output()
            .await
            .map_err(|e| SecretError::Provider(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(SecretError::Provider(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| SecretError::Provider(format!("{} printed non-UTF-8 output", self.program)))?;
        let value = stdout.trim_end_matches(['\r', '\n']);

        if value.is_empty() {
            return Err(SecretError::NotFound(reference.name.clone()));
        }

        Ok(Secret::new(value))
    }
}

pub fn provider_for(kind: &ProviderKind) -> Box<dyn SecretProvider> {
    match kind {
        ProviderKind::Env => Box::new(EnvSecretProvider),
        ProviderKind::Command { command, args } => {
            Box::new(CommandSecretProvider::new(command, args.clone()))
        }
    }
}

/// Resolve one configured credential through its secret provider.
pub async fn resolve(entry: &CredentialEntry, purpose: &str) -> Result<Credential> {
    let provider = provider_for(&entry.secret.provider);
    entry
        .credential_ref()
        .resolve(provider.as_ref())
        .await
        .with_context(|| format!("failed to obtain {purpose} password for {}", entry.username))
}

/// Listing and download credentials. The provider is only asked a second
/// time when the download credential differs from the listing one.
pub async fn resolve_credentials(config: &AppConfig) -> Result<(Credential, Credential)> {
    let listing = resolve(&config.credential, "listing").await?;

    let entry = config.download_credential();
    let download = if entry == &config.credential {
        listing.clone()
    } else {
        resolve(entry, "download").await?
    };

    Ok((listing, download))
}
