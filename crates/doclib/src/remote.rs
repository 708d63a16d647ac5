use std::sync::Arc;

use crate::download::DownloadError;
use crate::listing::RetrievalError;
use crate::record::{Credential, SourceUrl};

/// A document-library server reachable with credentials.
///
/// Implementations authenticate every call with the credential they are
/// handed. Nothing is cached between calls.
#[async_trait::async_trait]
pub trait Remote: Send + Sync {
    /// Fetch the machine-readable listing at `endpoint` as parsed JSON.
    async fn fetch_listing(
        &self,
        endpoint: &str,
        credential: &Credential,
    ) -> Result<serde_json::Value, RetrievalError>;

    /// Fetch the raw bytes of one document.
    async fn fetch_file(
        &self,
        url: &SourceUrl,
        credential: &Credential,
    ) -> Result<Vec<u8>, DownloadError>;
}

#[async_trait::async_trait]
impl<T: Remote + ?Sized> Remote for Arc<T> {
    async fn fetch_listing(
        &self,
        endpoint: &str,
        credential: &Credential,
    ) -> Result<serde_json::Value, RetrievalError> {
        (**self).fetch_listing(endpoint, credential).await
    }

    async fn fetch_file(
        &self,
        url: &SourceUrl,
        credential: &Credential,
    ) -> Result<Vec<u8>, DownloadError> {
        (**self).fetch_file(url, credential).await
    }
}
