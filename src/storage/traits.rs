use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content type of a cached payload; decides the on-disk suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Feed,
    Html,
    Transcript,
}

impl ContentKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            ContentKind::Feed => "xml",
            ContentKind::Html => "html",
            ContentKind::Transcript => "vtt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub kind: ContentKind,
    pub payload: String,
    pub stored_at: DateTime<Utc>,
}

/// Content-addressed cache keyed by remote locator.
///
/// Implementations never surface I/O errors: a failed read is a miss and a
/// failed write leaves the previous entry (if any) untouched.
#[cfg_attr(test, mockall::automock)]
pub trait CacheStore: Send + Sync {
    fn is_enabled(&self) -> bool;
    fn get(&self, locator: &str, kind: ContentKind) -> Option<String>;
    fn set(&self, locator: &str, payload: &str, kind: ContentKind);
    fn entry(&self, locator: &str, kind: ContentKind) -> Option<CacheEntry>;
}
