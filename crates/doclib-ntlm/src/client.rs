use std::time::Duration;

use doclib::Credential;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT, WWW_AUTHENTICATE};

use crate::handshake::{self, NtlmError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the NTLM HTTP client.
#[derive(Debug, Clone)]
pub struct NtlmClientConfig {
    /// Applied to every request, covering connect through body read.
    pub timeout: Duration,
    /// Workstation name presented during the handshake.
    pub workstation: String,
    pub user_agent: String,
}

impl Default for NtlmClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            workstation: "DOCLIB-FETCHER".into(),
            user_agent: "doclib-fetcher".into(),
        }
    }
}

/// Transport-level failures; callers map these onto their own error kinds.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("NTLM handshake failed: {0}")]
    Handshake(#[from] NtlmError),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// HTTP client that authenticates each GET with an NTLM handshake.
///
/// No authentication state is kept between calls: every `get` runs
/// negotiate → challenge → authenticate with the credential it is given.
pub struct NtlmClient {
    client: reqwest::Client,
    config: NtlmClientConfig,
}

impl NtlmClient {
    pub fn new(config: NtlmClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(1)
            .build()?;

        Ok(Self { client, config })
    }

    fn request(&self, url: &str, accept: Option<&str>) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .get(url)
            .header(USER_AGENT, &self.config.user_agent);

        if let Some(accept) = accept {
            req = req.header(ACCEPT, accept);
        }

        req
    }

    /// Authenticated GET. Returns the final response whatever its status.
    ///
    /// A server that does not answer the negotiate leg with a 401 NTLM
    /// challenge has its first response returned as-is.
    pub async fn get(
        &self,
        url: &str,
        credential: &Credential,
        accept: Option<&str>,
    ) -> Result<reqwest::Response, TransportError> {
        let negotiate = handshake::negotiate_header(&self.config.workstation)?;
        tracing::debug!(url, user = %credential.qualified_username(), "sending NTLM negotiate");

        let first = self
            .request(url, accept)
            .header(AUTHORIZATION, negotiate)
            .send()
            .await?;

        if first.status() != StatusCode::UNAUTHORIZED {
            return Ok(first);
        }

        let token = first
            .headers()
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(handshake::challenge_token)
            .map(str::to_owned);

        let Some(token) = token else {
            tracing::debug!(url, "401 without an NTLM challenge");
            return Ok(first);
        };

        // Drain the challenge body so the connection goes back to the pool;
        // NTLM authenticates the connection, not the request.
        let _ = first.bytes().await;

        let authenticate =
            handshake::authenticate_header(&token, credential, &self.config.workstation)?;
        tracing::debug!(url, "sending NTLM authenticate");

        let response = self
            .request(url, accept)
            .header(AUTHORIZATION, authenticate)
            .send()
            .await?;

        Ok(response)
    }
}
