use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use underdoc_core::error::{Result, UnderDocError};

const USER_AGENT: &str = concat!("underdoc-rust/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Downloads images over HTTP(S). One GET per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_DOWNLOAD_TIMEOUT)
    }

    /// Bounds each download, connect through last body byte, by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| UnderDocError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        debug!(url = %url, "Downloading remote image");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| UnderDocError::io(url.as_str(), format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, "Image download returned error status");
            return Err(UnderDocError::io(
                url.as_str(),
                format!(
                    "HTTP {}: {}",
                    status,
                    body.chars().take(500).collect::<String>()
                ),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| UnderDocError::io(url.as_str(), format!("failed to read body: {e}")))?;

        Ok(bytes.to_vec())
    }
}
