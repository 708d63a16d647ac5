use std::collections::HashMap;
use std::sync::Mutex;

use crate::{
    Credential, DownloadError, RetrievalError, Remote, Secret, SecretError, SecretProvider,
    SecretRef, SourceUrl,
};

/// In-memory remote for testing. Serves a fixed listing and a map of files,
/// and records every file URL requested.
#[derive(Default)]
pub struct InMemoryRemote {
    listing: Option<serde_json::Value>,
    files: HashMap<String, Result<Vec<u8>, DownloadError>>,
    requested: Mutex<Vec<String>>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(mut self, listing: serde_json::Value) -> Self {
        self.listing = Some(listing);
        self
    }

    pub fn add_file(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(url.into(), Ok(bytes));
    }

    pub fn add_failure(&mut self, url: impl Into<String>, error: DownloadError) {
        self.files.insert(url.into(), Err(error));
    }

    /// File URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Remote for InMemoryRemote {
    async fn fetch_listing(
        &self,
        _endpoint: &str,
        _credential: &Credential,
    ) -> Result<serde_json::Value, RetrievalError> {
        self.listing.clone().ok_or(RetrievalError::Status(404))
    }

    async fn fetch_file(
        &self,
        url: &SourceUrl,
        _credential: &Credential,
    ) -> Result<Vec<u8>, DownloadError> {
        self.requested.lock().unwrap().push(url.as_str().to_owned());
        self.files
            .get(url.as_str())
            .cloned()
            .unwrap_or(Err(DownloadError::Status(404)))
    }
}

/// Secret provider backed by a fixed name → value map.
pub struct StaticSecrets {
    secrets: HashMap<String, String>,
}

impl StaticSecrets {
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            secrets: entries
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        }
    }
}

#[async_trait::async_trait]
impl SecretProvider for StaticSecrets {
    async fn get_secret(&self, reference: &SecretRef) -> Result<Secret, SecretError> {
        self.secrets
            .get(&reference.name)
            .map(Secret::new)
            .ok_or_else(|| SecretError::NotFound(reference.name.clone()))
    }
}
