use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of failure categories a run can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FetchFailed,
    ParseFailed,
    EnrichmentUnavailable,
    EnrichmentFailed,
    Timeout,
    ConfigInvalid,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FetchFailed => "fetch_failed",
            ErrorKind::ParseFailed => "parse_failed",
            ErrorKind::EnrichmentUnavailable => "enrichment_unavailable",
            ErrorKind::EnrichmentFailed => "enrichment_failed",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ConfigInvalid => "config_invalid",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum IngestError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid parameter for {source_name}: {message}")]
    InvalidParameter {
        source_name: String,
        message: String,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Sources file error: {0}")]
    SourcesFile(#[from] toml::de::Error),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    // Parsing errors
    #[error("Feed parsing failed: {0}")]
    FeedParse(String),

    #[error("Page parsing failed: {0}")]
    PageParse(String),

    // Run control
    #[error("Run deadline of {0:?} exceeded")]
    Timeout(Duration),

    #[error("Adapter task failed: {0}")]
    Task(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IngestError {
    /// Category used when the error is recorded in a run result.
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Config(_)
            | IngestError::InvalidParameter { .. }
            | IngestError::InvalidUrl(_)
            | IngestError::SourcesFile(_) => ErrorKind::ConfigInvalid,
            IngestError::Http(_) | IngestError::HttpStatus { .. } => ErrorKind::FetchFailed,
            IngestError::FeedParse(_) | IngestError::PageParse(_) => ErrorKind::ParseFailed,
            IngestError::Timeout(_) => ErrorKind::Timeout,
            IngestError::Task(_) | IngestError::Io(_) | IngestError::Serialization(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// HTTP status of a failed request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            IngestError::HttpStatus { status, .. } => Some(*status),
            IngestError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type IngestResult<T> = Result<T, IngestError>;
