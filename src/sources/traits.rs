use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::{AdapterKind, Enrichment, ItemCore, SourceItem};
use crate::errors::IngestResult;
use crate::sources::window::{filter_window, TimeWindow};

/// One source family: how to locate, fetch, parse and enrich its content.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Identifies this adapter kind
    fn kind(&self) -> AdapterKind;

    /// Derive the primary locator for a configured parameter. Pure; rejects
    /// malformed parameters before any network call.
    fn locator(&self, param: &str) -> IngestResult<String>;

    /// Fetch the raw payload, consulting the cache first.
    async fn fetch_raw(&self, locator: &str) -> IngestResult<String>;

    /// Turn a raw payload into items in feed order. No network access.
    fn parse(&self, param: &str, raw: &str) -> IngestResult<Vec<SourceItem>>;

    /// Same as [`parse`](Self::parse), with relative timestamps ("2 hours
    /// ago") resolved against `now`.
    fn parse_at(
        &self,
        param: &str,
        raw: &str,
        _now: DateTime<Utc>,
    ) -> IngestResult<Vec<SourceItem>> {
        self.parse(param, raw)
    }

    /// Best-effort secondary fetch for one item.
    async fn enrich(&self, item: &SourceItem) -> Enrichment;

    /// fetch → parse → window filter → enrich the survivors.
    async fn run(&self, param: &str, window: &TimeWindow) -> IngestResult<Vec<SourceItem>> {
        let locator = self.locator(param)?;
        let raw = self.fetch_raw(&locator).await?;
        let parsed = self.parse_at(param, &raw, window.now)?;
        let parsed_count = parsed.len();
        let in_window = filter_window(parsed, window);

        debug!(
            kind = %self.kind(),
            parameter = param,
            parsed = parsed_count,
            in_window = in_window.len(),
            "parsed payload"
        );

        let mut items = Vec::with_capacity(in_window.len());
        for item in in_window {
            let enrichment = self.enrich(&item).await;
            match &enrichment {
                Enrichment::Available(_) => {}
                Enrichment::Unavailable(reason) => {
                    debug!(item = item.external_id(), reason = %reason, "enrichment unavailable");
                }
                Enrichment::Failed(reason) => {
                    warn!(item = item.external_id(), reason = %reason, "enrichment failed");
                }
            }
            items.push(item.with_enriched_text(enrichment.into_text()));
        }

        Ok(items)
    }
}
