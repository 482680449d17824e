use std::collections::HashSet;

use async_trait::async_trait;
use feed_rs::parser;
use tracing::debug;
use url::Url;

use crate::domain::{AdapterKind, Enrichment, NewsArticle, SourceItem};
use crate::errors::{IngestError, IngestResult};
use crate::sources::article::fetch_article_body;
use crate::sources::http::HttpFetcher;
use crate::sources::markdown::{fragment_to_markdown, html_to_text};
use crate::sources::traits::SourceAdapter;
use crate::storage::ContentKind;

/// News and blog feeds (RSS, Atom, JSON Feed) addressed by feed URL.
pub struct RssSource {
    fetcher: HttpFetcher,
}

impl RssSource {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self { fetcher }
    }

    fn parse_bytes(bytes: &[u8]) -> IngestResult<feed_rs::model::Feed> {
        parser::parse(bytes).map_err(|e| IngestError::FeedParse(e.to_string()))
    }

    fn article_url(entry: &feed_rs::model::Entry) -> Option<String> {
        entry
            .links
            .iter()
            .find(|l| l.rel.as_deref().map(|r| r == "alternate").unwrap_or(true))
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone())
            .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))
    }
}

pub(crate) fn validate_http_url(param: &str) -> IngestResult<String> {
    let param = param.trim();
    let parsed = Url::parse(param).map_err(|e| IngestError::InvalidUrl(format!("{}: {}", param, e)))?;

    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(param.to_string()),
        _ => Err(IngestError::InvalidUrl(format!(
            "{}: expected an http(s) URL",
            param
        ))),
    }
}

fn non_empty(s: String) -> Option<String> {
    let s = s.trim().to_string();
    (!s.is_empty()).then_some(s)
}

#[async_trait]
impl SourceAdapter for RssSource {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Rss
    }

    fn locator(&self, param: &str) -> IngestResult<String> {
        validate_http_url(param)
    }

    async fn fetch_raw(&self, locator: &str) -> IngestResult<String> {
        self.fetcher.fetch(locator, ContentKind::Feed).await
    }

    fn parse(&self, _param: &str, raw: &str) -> IngestResult<Vec<SourceItem>> {
        let parsed = Self::parse_bytes(raw.as_bytes())?;

        let mut seen = HashSet::new();
        let mut articles = Vec::new();

        for entry in parsed.entries {
            let Some(published_at) = entry.published.or(entry.updated) else {
                debug!(entry = %entry.id, "skipping undated entry");
                continue;
            };
            let Some(url) = Self::article_url(&entry) else {
                debug!(entry = %entry.id, "skipping entry without link");
                continue;
            };
            if !seen.insert(entry.id.clone()) {
                continue;
            }

            let title = entry
                .title
                .map(|t| html_to_text(&t.content))
                .and_then(non_empty)
                .unwrap_or_else(|| "Untitled".to_string());

            let description = entry
                .summary
                .map(|s| html_to_text(&s.content))
                .and_then(non_empty);

            // content:encoded (Substack, WordPress) or Atom <content>
            let body_text = entry
                .content
                .and_then(|c| c.body)
                .map(|body| fragment_to_markdown(&body))
                .and_then(non_empty);

            let category = entry.categories.first().map(|c| c.term.clone());
            let author = entry
                .authors
                .first()
                .map(|a| a.name.clone())
                .and_then(non_empty);

            articles.push(
                NewsArticle::new(entry.id, title, url, published_at)
                    .with_description(description)
                    .with_category(category)
                    .with_author(author)
                    .with_body_text(body_text)
                    .into(),
            );
        }

        Ok(articles)
    }

    async fn enrich(&self, item: &SourceItem) -> Enrichment {
        fetch_article_body(&self.fetcher, item).await
    }
}
