use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnderDocError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O failure reading {source_ref}: {message}")]
    Io { source_ref: String, message: String },

    #[error("Service failure{}: {body}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Service { status: Option<u16>, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid image reference: {0}")]
    InvalidReference(String),

    #[error("Worker failure: {0}")]
    Worker(String),

    #[error("Batch failed: {failed} of {total} items failed, first error: {first_error}")]
    BatchFailed {
        failed: usize,
        total: usize,
        first_error: String,
    },
}

impl UnderDocError {
    pub fn io(source_ref: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            source_ref: source_ref.into(),
            message: message.into(),
        }
    }

    pub fn service(status: Option<u16>, body: impl Into<String>) -> Self {
        Self::Service {
            status,
            body: body.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::Io { .. } => ErrorKind::IoFailure,
            Self::Service { .. } => ErrorKind::ServiceFailure,
            Self::Config(_) => ErrorKind::ConfigurationError,
            Self::InvalidReference(_) => ErrorKind::InvalidReference,
            Self::Worker(_) => ErrorKind::WorkerFailure,
            Self::BatchFailed { .. } => ErrorKind::BatchFailed,
        }
    }
}

/// Transport errors from talking to the extraction service.
impl From<reqwest::Error> for UnderDocError {
    fn from(err: reqwest::Error) -> Self {
        Self::Service {
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
        }
    }
}

/// A response body that does not match the expected schema.
impl From<serde_json::Error> for UnderDocError {
    fn from(err: serde_json::Error) -> Self {
        Self::Service {
            status: None,
            body: format!("malformed response body: {err}"),
        }
    }
}

/// Serializable error category, carried by per-item batch failures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedFormat,
    IoFailure,
    ServiceFailure,
    ConfigurationError,
    InvalidReference,
    WorkerFailure,
    BatchFailed,
}

pub type Result<T> = std::result::Result<T, UnderDocError>;
