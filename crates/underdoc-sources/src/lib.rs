use std::sync::Arc;

use async_trait::async_trait;

use underdoc_core::config::ClientConfig;
use underdoc_core::error::Result;
use underdoc_core::image::ImageReference;
use underdoc_core::resolver::{ImageResolver, ResolvedImage};

mod enumerate;
mod http;
mod local;
mod object;

pub use enumerate::BatchSource;
pub use http::{HttpImageSource, DEFAULT_DOWNLOAD_TIMEOUT};
pub use local::LocalFileSource;
pub use object::{BucketProvider, ObjectStoreSource, S3BucketProvider, StaticBucketProvider};

/// Resolves any [`ImageReference`] variant. No fetched bytes are cached.
#[derive(Clone)]
pub struct SourceResolver {
    local: LocalFileSource,
    http: HttpImageSource,
    object: ObjectStoreSource,
}

impl SourceResolver {
    /// Local files, HTTP(S) downloads and S3 with the default credential chain.
    pub fn new() -> Result<Self> {
        Ok(Self {
            local: LocalFileSource::new(),
            http: HttpImageSource::new()?,
            object: ObjectStoreSource::s3(),
        })
    }

    /// Like [`SourceResolver::new`], with downloads bounded by the configured
    /// single-call timeout.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            local: LocalFileSource::new(),
            http: HttpImageSource::with_timeout(config.timeout())?,
            object: ObjectStoreSource::s3(),
        })
    }

    pub fn with_bucket_provider(mut self, provider: Arc<dyn BucketProvider>) -> Self {
        self.object = ObjectStoreSource::new(provider);
        self
    }

    pub fn with_http(mut self, http: HttpImageSource) -> Self {
        self.http = http;
        self
    }

    pub fn objects(&self) -> &ObjectStoreSource {
        &self.object
    }
}

#[async_trait]
impl ImageResolver for SourceResolver {
    async fn resolve(&self, reference: &ImageReference) -> Result<ResolvedImage> {
        let format = reference.format()?;

        let bytes = match reference {
            ImageReference::Path { path } => self.local.fetch(path).await?,
            ImageReference::Url { url } => self.http.fetch(url).await?,
            ImageReference::Object(locator) => self.object.fetch(locator).await?,
        };

        Ok(ResolvedImage { format, bytes })
    }
}

#[cfg(test)]
mod tests {
    use object_store::memory::InMemory;

    use underdoc_core::error::UnderDocError;
    use underdoc_core::image::ImageFormat;

    use super::*;

    fn resolver() -> SourceResolver {
        SourceResolver::new()
            .unwrap()
            .with_bucket_provider(Arc::new(StaticBucketProvider::new()))
    }

    #[tokio::test]
    async fn test_resolve_local_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.PNG");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let resolved = resolver()
            .resolve(&ImageReference::path(&path))
            .await
            .unwrap();
        assert_eq!(resolved.format, ImageFormat::Png);
        assert_eq!(resolved.bytes, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_unsupported_format_checked_before_io() {
        // The file does not exist: the format error must win over the I/O error
        let err = resolver()
            .resolve(&ImageReference::path("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, UnderDocError::UnsupportedFormat(ext) if ext == "pdf"));

        // Unroutable address: no request is attempted for an unsupported suffix
        let reference = ImageReference::url("http://192.0.2.1/scan.tiff").unwrap();
        let err = resolver().resolve(&reference).await.unwrap_err();
        assert!(matches!(err, UnderDocError::UnsupportedFormat(_)));

        // Unknown bucket would be an Io error if it were opened
        let reference = ImageReference::object("nowhere", "scan.bmp").unwrap();
        let err = resolver().resolve(&reference).await.unwrap_err();
        assert!(matches!(err, UnderDocError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_resolve_object() {
        use object_store::path::Path;
        use object_store::{ObjectStore, PutPayload};

        let store = Arc::new(InMemory::new());
        store
            .put(&Path::from("r/1.jpeg"), PutPayload::from(b"abc".to_vec()))
            .await
            .unwrap();
        let resolver = SourceResolver::new()
            .unwrap()
            .with_bucket_provider(Arc::new(StaticBucketProvider::new().with_bucket("b", store)));

        let resolved = resolver
            .resolve(&ImageReference::object("b", "r/1.jpeg").unwrap())
            .await
            .unwrap();
        assert_eq!(resolved.format, ImageFormat::Jpeg);
        assert_eq!(resolved.bytes, b"abc");
    }
}
