use std::sync::Arc;

use crate::domain::AdapterKind;
use crate::sources::html::HtmlIndexSource;
use crate::sources::http::HttpFetcher;
use crate::sources::rss::RssSource;
use crate::sources::traits::SourceAdapter;
use crate::sources::youtube::{YouTubeSource, DEFAULT_BASE_URL};

/// Settings that shape how the built-in adapters reach their upstreams.
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    pub youtube_base_url: String,
    /// Transcript languages in preference order
    pub transcript_languages: Vec<String>,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            youtube_base_url: DEFAULT_BASE_URL.to_string(),
            transcript_languages: vec!["en".to_string()],
        }
    }
}

pub struct SourceRegistry {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    /// Registry with every built-in adapter sharing one fetcher.
    pub fn new(fetcher: HttpFetcher, options: &AdapterOptions) -> Self {
        let mut registry = Self::empty();

        registry.register(Arc::new(YouTubeSource::with_base_url(
            fetcher.clone(),
            &options.youtube_base_url,
            options.transcript_languages.clone(),
        )));
        registry.register(Arc::new(RssSource::new(fetcher.clone())));
        registry.register(Arc::new(HtmlIndexSource::new(fetcher)));

        registry
    }

    pub fn empty() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Add an adapter; one already registered for the same kind is replaced.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.retain(|a| a.kind() != adapter.kind());
        self.adapters.push(adapter);
    }

    pub fn find(&self, kind: AdapterKind) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.iter().find(|a| a.kind() == kind).cloned()
    }

    pub fn kinds(&self) -> Vec<AdapterKind> {
        self.adapters.iter().map(|a| a.kind()).collect()
    }
}
