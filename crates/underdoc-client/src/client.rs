use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info};

use underdoc_core::config::ClientConfig;
use underdoc_core::error::{Result, UnderDocError};
use underdoc_core::expense::{ExtractionRequest, ExtractionResponse};
use underdoc_core::extractor::Extractor;
use underdoc_core::image::ImageReference;
use underdoc_core::resolver::{ImageResolver, ResolvedImage};
use underdoc_sources::SourceResolver;

pub const API_KEY_HEADER: &str = "UNDERDOC_API_KEY";

const USER_AGENT: &str = concat!("underdoc-rust/", env!("CARGO_PKG_VERSION"));

/// Client for the UnderDoc expense extraction API.
///
/// Cheap to clone: the HTTP connection pool, configuration and resolver are
/// shared, and none of them is mutated after construction.
#[derive(Clone)]
pub struct UnderDocClient {
    http: Client,
    config: Arc<ClientConfig>,
    resolver: Arc<dyn ImageResolver>,
}

impl UnderDocClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let resolver = SourceResolver::from_config(&config)?;
        Self::with_resolver(config, Arc::new(resolver))
    }

    /// Builds a client from `UNDERDOC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn with_resolver(config: ClientConfig, resolver: Arc<dyn ImageResolver>) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| UnderDocError::Config(format!("failed to build HTTP client: {e}")))?;

        info!(endpoint = %config.api_endpoint, "UnderDoc client initialized");

        Ok(Self {
            http,
            config: Arc::new(config),
            resolver,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_request(image: &ResolvedImage) -> ExtractionRequest {
        ExtractionRequest {
            image_format: image.format,
            image_data: STANDARD.encode(&image.bytes),
        }
    }

    fn parse_response(body: &str) -> Result<ExtractionResponse> {
        serde_json::from_str(body).map_err(|e| {
            error!(error = %e, "Extraction response does not match the expected schema");
            UnderDocError::service(Some(200), format!("malformed response body: {e}: {body}"))
        })
    }

    async fn call_extract(&self, request: &ExtractionRequest, timeout: Duration) -> Result<String> {
        let url = self.config.extract_url();

        debug!(
            url = %url,
            image_format = %request.image_format,
            payload_len = request.image_data.len(),
            "Sending extraction request"
        );

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(request)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(UnderDocError::service(Some(status.as_u16()), body));
        }

        Ok(body)
    }

    async fn extract_with_timeout(
        &self,
        reference: &ImageReference,
        timeout: Duration,
    ) -> Result<ExtractionResponse> {
        info!(source = %reference, "Starting expense extraction");

        let image = self.resolver.resolve(reference).await?;
        let request = Self::build_request(&image);
        let body = self.call_extract(&request, timeout).await?;
        let response = Self::parse_response(&body)?;

        info!(
            source = %reference,
            image_type = ?response.receipt_data.image_type,
            has_expense = response.receipt_data.expense.is_some(),
            "Extraction complete"
        );

        Ok(response)
    }
}

#[async_trait]
impl Extractor for UnderDocClient {
    async fn extract(&self, reference: &ImageReference) -> Result<ExtractionResponse> {
        self.extract_with_timeout(reference, self.config.timeout())
            .await
    }

    async fn extract_in_batch(&self, reference: &ImageReference) -> Result<ExtractionResponse> {
        self.extract_with_timeout(reference, self.config.batch_timeout())
            .await
    }
}
