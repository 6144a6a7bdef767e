use async_trait::async_trait;

use crate::error::Result;
use crate::expense::ExtractionResponse;
use crate::image::ImageReference;

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, reference: &ImageReference) -> Result<ExtractionResponse>;

    /// Extraction performed by a batch worker. Workers may queue behind rate
    /// limits, so implementations can apply a longer deadline here.
    async fn extract_in_batch(&self, reference: &ImageReference) -> Result<ExtractionResponse> {
        self.extract(reference).await
    }
}
