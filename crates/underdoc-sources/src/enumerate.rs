use tracing::{info, warn};

use underdoc_core::error::{Result, UnderDocError};
use underdoc_core::image::{ImageReference, ObjectLocator};

use crate::object::ObjectStoreSource;

/// The collection of images a batch runs over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSource {
    /// Local files matching a glob pattern, e.g. `receipts/*.jpg`.
    Glob(String),
    /// Every object in a bucket.
    Bucket(String),
    References(Vec<ImageReference>),
}

impl BatchSource {
    /// Expand the source into concrete references. Runs once, eagerly, before
    /// any extraction starts.
    pub async fn enumerate(&self, objects: &ObjectStoreSource) -> Result<Vec<ImageReference>> {
        let references = match self {
            Self::Glob(pattern) => expand_glob(pattern)?,
            Self::Bucket(bucket) => objects
                .list_keys(bucket)
                .await?
                .into_iter()
                .map(|key| {
                    ObjectLocator::new(bucket.as_str(), key).map(ImageReference::Object)
                })
                .collect::<Result<Vec<_>>>()?,
            Self::References(references) => references.clone(),
        };

        info!(source = %self, count = references.len(), "Enumerated batch references");
        Ok(references)
    }
}

impl std::fmt::Display for BatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Glob(pattern) => write!(f, "glob:{pattern}"),
            Self::Bucket(bucket) => write!(f, "bucket:{bucket}"),
            Self::References(references) => write!(f, "references:{}", references.len()),
        }
    }
}

fn expand_glob(pattern: &str) -> Result<Vec<ImageReference>> {
    let paths = glob::glob(pattern)
        .map_err(|e| UnderDocError::InvalidReference(format!("invalid glob '{pattern}': {e}")))?;

    let mut references = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => references.push(ImageReference::path(path)),
            Ok(_) => {}
            Err(e) => {
                warn!(
                    pattern = %pattern,
                    path = %e.path().display(),
                    error = %e.error(),
                    "Glob entry could not be read"
                );
                return Err(UnderDocError::io(
                    e.path().display().to_string(),
                    format!("failed to read while expanding '{pattern}': {}", e.error()),
                ));
            }
        }
    }
    Ok(references)
}
