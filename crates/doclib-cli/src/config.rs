use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use doclib::{CredentialRef, ListingSchema, RecordFilter, SecretRef};
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Machine-readable listing URL of the document library.
    pub endpoint_url: String,
    #[serde(default = "default_destination")]
    pub destination_dir: PathBuf,
    #[serde(default)]
    pub overwrite: bool,
    pub category_filter: Option<String>,
    pub extension_filter: Option<String>,
    pub max_files: Option<usize>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub workstation: Option<String>,
    /// Credential for the listing request.
    pub credential: CredentialEntry,
    /// Credential for file downloads; defaults to `credential`.
    pub download_credential: Option<CredentialEntry>,
    #[serde(default)]
    pub schema: ListingSchema,
}

/// A credential: domain and username here, password from a secret provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialEntry {
    #[serde(default)]
    pub domain: String,
    pub username: String,
    pub secret: SecretEntry,
}

/// Where a password lives and which provider fetches it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SecretEntry {
    #[serde(flatten)]
    pub reference: SecretRef,
    #[serde(flatten)]
    pub provider: ProviderKind,
}

/// The kind of secret provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "provider")]
pub enum ProviderKind {
    /// Read the environment variable named by the secret's `name`.
    #[serde(rename = "env")]
    Env,

    /// Run an external vault helper: `command [args..] name [key_reference] [vault_reference]`.
    #[serde(rename = "command")]
    Command {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl CredentialEntry {
    pub fn credential_ref(&self) -> CredentialRef {
        CredentialRef {
            domain: self.domain.clone(),
            username: self.username.clone(),
            secret: self.secret.reference.clone(),
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub destination_dir: Option<PathBuf>,
    pub overwrite: Option<bool>,
    pub category: Option<String>,
    pub extension: Option<String>,
    pub max_files: Option<usize>,
}

impl AppConfig {
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(dest) = overrides.destination_dir {
            self.destination_dir = dest;
        }
        if let Some(overwrite) = overrides.overwrite {
            self.overwrite = overwrite;
        }
        if overrides.category.is_some() {
            self.category_filter = overrides.category;
        }
        if overrides.extension.is_some() {
            self.extension_filter = overrides.extension;
        }
        if overrides.max_files.is_some() {
            self.max_files = overrides.max_files;
        }
    }

    pub fn record_filter(&self) -> RecordFilter {
        RecordFilter::new(self.category_filter.clone(), self.extension_filter.clone())
    }

    pub fn download_credential(&self) -> &CredentialEntry {
        self.download_credential.as_ref().unwrap_or(&self.credential)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_destination() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_timeout_secs() -> u64 {
    60
}

/// Config file path: `~/.config/doclib-fetcher/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("doclib-fetcher").join("config.toml"))
}

/// Load config from `path`, or from the default location when none is given.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_path().context("could not determine config directory")?,
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;

    parse_config(&contents).with_context(|| format!("failed to parse config at {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents)?;
    if config.timeout_secs == 0 {
        anyhow::bail!("timeout_secs must be greater than zero");
    }
    Ok(config)
}
