use crate::errors::ErrorKind;

/// Outcome of the optional per-item secondary fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    Available(String),
    /// Fetched fine, but the content genuinely does not exist.
    Unavailable(String),
    /// Transient error while fetching or converting the content.
    Failed(String),
}

impl Enrichment {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Enrichment::Available(_) => None,
            Enrichment::Unavailable(_) => Some(ErrorKind::EnrichmentUnavailable),
            Enrichment::Failed(_) => Some(ErrorKind::EnrichmentFailed),
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Enrichment::Available(text) => Some(text),
            Enrichment::Unavailable(_) | Enrichment::Failed(_) => None,
        }
    }

    /// `Available` when the text has content, `Unavailable` otherwise.
    pub fn from_text(text: String, missing_reason: &str) -> Self {
        let text = text.trim().to_string();
        if text.is_empty() {
            Enrichment::Unavailable(missing_reason.to_string())
        } else {
            Enrichment::Available(text)
        }
    }
}
