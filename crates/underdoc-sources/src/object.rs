//! Object-store backed image source.
//!
//! Buckets are opened through a [`BucketProvider`], so the same resolver works
//! against S3 with the default AWS credential chain, an S3-compatible service,
//! or an in-memory store in tests.

use std::collections::HashMap;
use std::sync::Arc;

use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::ObjectStore;
use tracing::{debug, info};

use underdoc_core::error::{Result, UnderDocError};
use underdoc_core::image::ObjectLocator;

pub trait BucketProvider: Send + Sync {
    fn bucket(&self, name: &str) -> Result<Arc<dyn ObjectStore>>;
}

/// Opens S3 buckets using `AWS_*` environment variables and the default
/// credential chain.
#[derive(Debug, Clone, Default)]
pub struct S3BucketProvider;

impl BucketProvider for S3BucketProvider {
    fn bucket(&self, name: &str) -> Result<Arc<dyn ObjectStore>> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(name)
            .build()
            .map_err(|e| UnderDocError::io(name, format!("failed to open bucket: {e}")))?;
        Ok(Arc::new(store))
    }
}

/// A fixed set of pre-built stores, keyed by bucket name.
#[derive(Default, Clone)]
pub struct StaticBucketProvider {
    buckets: HashMap<String, Arc<dyn ObjectStore>>,
}

impl StaticBucketProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(mut self, name: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        self.buckets.insert(name.into(), store);
        self
    }
}

impl BucketProvider for StaticBucketProvider {
    fn bucket(&self, name: &str) -> Result<Arc<dyn ObjectStore>> {
        self.buckets
            .get(name)
            .cloned()
            .ok_or_else(|| UnderDocError::io(name, "unknown bucket"))
    }
}

#[derive(Clone)]
pub struct ObjectStoreSource {
    provider: Arc<dyn BucketProvider>,
}

impl ObjectStoreSource {
    pub fn new(provider: Arc<dyn BucketProvider>) -> Self {
        Self { provider }
    }

    pub fn s3() -> Self {
        Self::new(Arc::new(S3BucketProvider))
    }

    /// Fetch the full object body into memory.
    pub async fn fetch(&self, locator: &ObjectLocator) -> Result<Vec<u8>> {
        debug!(bucket = %locator.bucket, key = %locator.key, "Fetching object");

        let source_ref = format!("{}/{}", locator.bucket, locator.key);
        let store = self.provider.bucket(&locator.bucket)?;
        let path = Path::from(locator.key.as_str());

        let result = store
            .get(&path)
            .await
            .map_err(|e| UnderDocError::io(&source_ref, e.to_string()))?;
        let bytes = result
            .bytes()
            .await
            .map_err(|e| UnderDocError::io(&source_ref, e.to_string()))?;

        Ok(bytes.to_vec())
    }

    /// List every key in `bucket`, across all listing pages.
    pub async fn list_keys(&self, bucket: &str) -> Result<Vec<String>> {
        let store = self.provider.bucket(bucket)?;

        let metas: Vec<_> = store
            .list(None)
            .try_collect()
            .await
            .map_err(|e| UnderDocError::io(bucket, format!("failed to list objects: {e}")))?;

        let keys: Vec<String> = metas.into_iter().map(|m| m.location.to_string()).collect();
        info!(bucket = %bucket, count = keys.len(), "Listed bucket objects");
        Ok(keys)
    }
}
