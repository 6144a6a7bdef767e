use async_trait::async_trait;

use crate::error::Result;
use crate::image::{ImageFormat, ImageReference};

/// Raw image bytes plus the format inferred from the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

/// Turns an [`ImageReference`] into bytes. Implementations must reject an
/// unsupported format before doing any I/O.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    async fn resolve(&self, reference: &ImageReference) -> Result<ResolvedImage>;
}
