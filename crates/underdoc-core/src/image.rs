use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, UnderDocError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Infer the image format from the lowercase suffix after the last `.` of
/// the final segment of `name`.
pub fn infer_format(name: &str) -> Result<ImageFormat> {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    let extension = match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => return Err(UnderDocError::UnsupportedFormat(String::new())),
    };

    match extension.as_str() {
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "png" => Ok(ImageFormat::Png),
        _ => Err(UnderDocError::UnsupportedFormat(extension)),
    }
}

/// A (bucket, key) pair identifying an object in remote storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ObjectLocator {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocator {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let bucket = bucket.into();
        let key = key.into();
        if bucket.trim().is_empty() {
            return Err(UnderDocError::InvalidReference(
                "object bucket must not be empty".into(),
            ));
        }
        if key.trim().is_empty() {
            return Err(UnderDocError::InvalidReference(
                "object key must not be empty".into(),
            ));
        }
        Ok(Self { bucket, key })
    }
}

/// Where an image lives. Exactly one source per reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageReference {
    Path { path: PathBuf },
    Url { url: Url },
    Object(ObjectLocator),
}

impl ImageReference {
    pub fn path(path: impl AsRef<Path>) -> Self {
        Self::Path {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse and validate a remote image URL. Only `http` and `https` are accepted.
    pub fn url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)
            .map_err(|e| UnderDocError::InvalidReference(format!("{raw}: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(Self::Url { url }),
            other => Err(UnderDocError::InvalidReference(format!(
                "{raw}: unsupported URL scheme '{other}'"
            ))),
        }
    }

    pub fn object(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        Ok(Self::Object(ObjectLocator::new(bucket, key)?))
    }

    /// The name the image format is inferred from.
    pub fn format_hint(&self) -> String {
        match self {
            Self::Path { path } => path.to_string_lossy().into_owned(),
            Self::Url { url } => url.path().to_string(),
            Self::Object(locator) => locator.key.clone(),
        }
    }

    pub fn format(&self) -> Result<ImageFormat> {
        infer_format(&self.format_hint())
    }
}

/// Renders the source file name reported alongside batch results: the path,
/// the URL, or the object key.
impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path { path } => write!(f, "{}", path.display()),
            Self::Url { url } => write!(f, "{url}"),
            Self::Object(locator) => f.write_str(&locator.key),
        }
    }
}
