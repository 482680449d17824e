use crate::domain::{Enrichment, ItemCore, SourceItem};
use crate::sources::http::HttpFetcher;
use crate::sources::markdown::page_to_markdown;
use crate::storage::ContentKind;

/// Full article body as markdown, fetched from the item's own URL unless the
/// feed already carried it.
pub async fn fetch_article_body(fetcher: &HttpFetcher, item: &SourceItem) -> Enrichment {
    if let Some(body) = item.body_text().filter(|b| !b.trim().is_empty()) {
        return Enrichment::Available(body.to_string());
    }

    match fetcher.fetch(item.url(), ContentKind::Html).await {
        Ok(html) => Enrichment::from_text(
            page_to_markdown(&html),
            "page has no extractable content",
        ),
        Err(e) if matches!(e.status(), Some(404) | Some(410)) => {
            Enrichment::Unavailable(format!("article page gone: {}", e))
        }
        Err(e) => Enrichment::Failed(e.to_string()),
    }
}
