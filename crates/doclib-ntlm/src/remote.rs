use doclib::{Credential, DownloadError, Remote, RetrievalError, SourceUrl};

use crate::client::{NtlmClient, NtlmClientConfig, TransportError};

/// Accept header for SharePoint-style REST listings.
pub const LISTING_ACCEPT: &str = "application/json;odata=verbose";

/// A document library served over NTLM-authenticated HTTP.
pub struct NtlmRemote {
    client: NtlmClient,
}

impl NtlmRemote {
    pub fn new(config: NtlmClientConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: NtlmClient::new(config)?,
        })
    }
}

impl From<TransportError> for RetrievalError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout => RetrievalError::Timeout,
            other => RetrievalError::Network(other.to_string()),
        }
    }
}

fn download_error(e: TransportError) -> DownloadError {
    match e {
        TransportError::Timeout => DownloadError::Timeout,
        other => DownloadError::Network(other.to_string()),
    }
}

#[async_trait::async_trait]
impl Remote for NtlmRemote {
    async fn fetch_listing(
        &self,
        endpoint: &str,
        credential: &Credential,
    ) -> Result<serde_json::Value, RetrievalError> {
        let response = self
            .client
            .get(endpoint, credential, Some(LISTING_ACCEPT))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RetrievalError::from(TransportError::from(e)))?;

        serde_json::from_slice(&body).map_err(|e| RetrievalError::Parse(e.to_string()))
    }

    async fn fetch_file(
        &self,
        url: &SourceUrl,
        credential: &Credential,
    ) -> Result<Vec<u8>, DownloadError> {
        let response = self
            .client
            .get(url.as_str(), credential, None)
            .await
            .map_err(download_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| download_error(TransportError::from(e)))?;

        Ok(body.to_vec())
    }
}
