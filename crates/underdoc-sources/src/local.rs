use std::path::Path;

use tracing::debug;

use underdoc_core::error::{Result, UnderDocError};

/// Reads images from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSource;

impl LocalFileSource {
    pub fn new() -> Self {
        Self
    }

    pub async fn fetch(&self, path: &Path) -> Result<Vec<u8>> {
        debug!(path = %path.display(), "Reading local image");

        tokio::fs::read(path)
            .await
            .map_err(|e| UnderDocError::io(path.display().to_string(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn test_fetch_reads_whole_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\xff\xd8\xff\xe0fake-jpeg").unwrap();

        let bytes = LocalFileSource::new().fetch(file.path()).await.unwrap();
        assert_eq!(bytes, b"\xff\xd8\xff\xe0fake-jpeg");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.jpg");

        match LocalFileSource::new().fetch(&missing).await {
            Err(UnderDocError::Io { source_ref, .. }) => {
                assert!(source_ref.ends_with("nope.jpg"));
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
