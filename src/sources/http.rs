use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::task;
use tracing::{debug, warn};

use crate::errors::{IngestError, IngestResult};
use crate::storage::{CacheStore, ContentKind};

pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) ingestor/0.1";

/// Cache-aside HTTP fetch shared by every adapter.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    cache: Arc<dyn CacheStore>,
}

impl HttpFetcher {
    pub fn new(cache: Arc<dyn CacheStore>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            cache,
        }
    }

    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.as_ref()
    }

    /// Return the cached payload for `locator`, or fetch it and populate the cache.
    pub async fn fetch(&self, locator: &str, kind: ContentKind) -> IngestResult<String> {
        if let Some(payload) = self.cached(locator, kind).await {
            return Ok(payload);
        }

        let body = self.fetch_remote(locator).await?;
        self.store(locator, body.clone(), kind).await;
        Ok(body)
    }

    // Cache access is blocking file I/O, so it runs on the blocking pool.
    async fn cached(&self, locator: &str, kind: ContentKind) -> Option<String> {
        let cache = Arc::clone(&self.cache);
        let key = locator.to_string();

        match task::spawn_blocking(move || cache.get(&key, kind)).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(locator, error = %e, "cache lookup task failed, treating as miss");
                None
            }
        }
    }

    async fn store(&self, locator: &str, body: String, kind: ContentKind) {
        let cache = Arc::clone(&self.cache);
        let key = locator.to_string();

        if let Err(e) = task::spawn_blocking(move || cache.set(&key, &body, kind)).await {
            warn!(locator, error = %e, "cache write task failed");
        }
    }

    async fn fetch_remote(&self, locator: &str) -> IngestResult<String> {
        debug!(locator, "fetching");
        let response = self.client.get(locator).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::HttpStatus {
                status: status.as_u16(),
                url: locator.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
