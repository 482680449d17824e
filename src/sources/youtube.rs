use std::collections::HashSet;

use async_trait::async_trait;
use feed_rs::parser;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::domain::{AdapterKind, ChannelVideo, Enrichment, SourceItem};
use crate::errors::{IngestError, IngestResult};
use crate::sources::http::HttpFetcher;
use crate::sources::traits::SourceAdapter;
use crate::sources::transcript::parse_transcript;
use crate::storage::ContentKind;

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

static CHANNEL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^UC[\w-]{22}$").expect("valid regex"));
static CHANNEL_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"youtube\.com/channel/(UC[\w-]{22})").expect("valid regex"));
static VIDEO_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|embed/|shorts/|live/|v/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("valid regex")
});

pub struct YouTubeSource {
    fetcher: HttpFetcher,
    base_url: String,
    languages: Vec<String>,
}

impl YouTubeSource {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self::with_base_url(fetcher, DEFAULT_BASE_URL, vec!["en".to_string()])
    }

    pub fn with_base_url(fetcher: HttpFetcher, base_url: &str, languages: Vec<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            languages,
        }
    }

    /// Accepts a bare channel ID or a /channel/UC... URL.
    pub fn channel_id(param: &str) -> IngestResult<String> {
        let param = param.trim();
        if CHANNEL_ID_RE.is_match(param) {
            return Ok(param.to_string());
        }
        if let Some(caps) = CHANNEL_URL_RE.captures(param) {
            return Ok(caps[1].to_string());
        }

        Err(IngestError::InvalidUrl(format!(
            "Could not extract YouTube channel ID from '{}'",
            param
        )))
    }

    /// Extract the 11-character video ID from the known YouTube URL shapes.
    pub fn extract_video_id(url: &str) -> Option<String> {
        VIDEO_ID_RE.captures(url).map(|caps| caps[1].to_string())
    }

    /// Build the RSS feed URL from a channel ID
    pub fn build_feed_url(&self, channel_id: &str) -> String {
        format!("{}/feeds/videos.xml?channel_id={}", self.base_url, channel_id)
    }

    pub fn build_transcript_url(&self, video_id: &str, language: &str) -> String {
        format!(
            "{}/api/timedtext?v={}&lang={}&fmt=vtt",
            self.base_url, video_id, language
        )
    }

    async fn fetch_transcript(&self, video_id: &str) -> Enrichment {
        for language in &self.languages {
            let locator = self.build_transcript_url(video_id, language);

            match self.fetcher.fetch(&locator, ContentKind::Transcript).await {
                Ok(body) => {
                    let text = parse_transcript(&body);
                    if !text.is_empty() {
                        return Enrichment::Available(text);
                    }
                }
                Err(e) if e.status() == Some(404) => {}
                Err(e) if e.status() == Some(429) => {
                    warn!(video_id, "rate limited by YouTube while fetching transcript");
                    return Enrichment::Failed(e.to_string());
                }
                Err(e) => return Enrichment::Failed(e.to_string()),
            }
        }

        Enrichment::Unavailable(format!("no captions for video {}", video_id))
    }
}

#[async_trait]
impl SourceAdapter for YouTubeSource {
    fn kind(&self) -> AdapterKind {
        AdapterKind::YouTube
    }

    fn locator(&self, param: &str) -> IngestResult<String> {
        let channel_id = Self::channel_id(param)?;
        Ok(self.build_feed_url(&channel_id))
    }

    async fn fetch_raw(&self, locator: &str) -> IngestResult<String> {
        self.fetcher.fetch(locator, ContentKind::Feed).await
    }

    fn parse(&self, param: &str, raw: &str) -> IngestResult<Vec<SourceItem>> {
        let channel_id = Self::channel_id(param)?;
        let feed =
            parser::parse(raw.as_bytes()).map_err(|e| IngestError::FeedParse(e.to_string()))?;

        let mut seen = HashSet::new();
        let mut videos = Vec::new();

        for entry in feed.entries {
            let Some(published_at) = entry.published.or(entry.updated) else {
                debug!(entry = %entry.id, "skipping undated entry");
                continue;
            };

            let link = entry
                .links
                .iter()
                .find(|l| l.rel.as_deref() == Some("alternate"))
                .or_else(|| entry.links.first())
                .map(|l| l.href.clone());
            let Some(url) = link else {
                debug!(entry = %entry.id, "skipping entry without link");
                continue;
            };

            if !seen.insert(entry.id.clone()) {
                continue;
            }

            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());

            let description = entry
                .media
                .iter()
                .find_map(|m| m.description.as_ref().map(|d| d.content.clone()))
                .or_else(|| entry.summary.map(|s| s.content))
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty());

            let video_id = Self::extract_video_id(&url);

            videos.push(
                ChannelVideo::new(entry.id, title, url, published_at, channel_id.clone())
                    .with_description(description)
                    .with_video_id(video_id)
                    .into(),
            );
        }

        Ok(videos)
    }

    async fn enrich(&self, item: &SourceItem) -> Enrichment {
        let video_id = match item {
            SourceItem::Video(video) => video.video_id.as_deref(),
            SourceItem::Article(_) => None,
        };

        match video_id {
            Some(video_id) => self.fetch_transcript(video_id).await,
            None => Enrichment::Unavailable("item has no video ID".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemCore;
    use crate::errors::ErrorKind;
    use crate::storage::FileCacheStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn source() -> YouTubeSource {
        let fetcher = HttpFetcher::new(
            Arc::new(FileCacheStore::disabled()),
            Duration::from_secs(5),
        );
        YouTubeSource::new(fetcher)
    }

    const CHANNEL: &str = "UC_x5XG1OV2P6uZZ5FSM9Ttw";

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
  <link rel="self" href="http://www.youtube.com/feeds/videos.xml?channel_id=UC_x5XG1OV2P6uZZ5FSM9Ttw"/>
  <id>yt:channel:_x5XG1OV2P6uZZ5FSM9Ttw</id>
  <title>Google for Developers</title>
  <published>2007-08-23T00:34:43+00:00</published>
  <entry>
    <id>yt:video:dQw4w9WgXcQ</id>
    <yt:videoId>dQw4w9WgXcQ</yt:videoId>
    <title>First video</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=dQw4w9WgXcQ"/>
    <published>2024-01-15T10:00:00+00:00</published>
    <updated>2024-01-15T11:00:00+00:00</updated>
    <media:group>
      <media:title>First video</media:title>
      <media:description>All about the first video</media:description>
    </media:group>
  </entry>
  <entry>
    <id>yt:video:oddlinkxxxx</id>
    <title>Community post</title>
    <link rel="alternate" href="https://www.youtube.com/post/Ugkxabc"/>
    <published>2024-01-14T10:00:00+00:00</published>
    <updated>2024-01-14T10:00:00+00:00</updated>
  </entry>
  <entry>
    <id>yt:video:dQw4w9WgXcQ</id>
    <title>Duplicate of first</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=dQw4w9WgXcQ"/>
    <published>2024-01-13T10:00:00+00:00</published>
  </entry>
</feed>"#;

    #[test]
    fn test_build_feed_url() {
        let feed_url = source().build_feed_url("UCxxxxxxxxxxxxxxxxxxxxxx");
        assert_eq!(
            feed_url,
            "https://www.youtube.com/feeds/videos.xml?channel_id=UCxxxxxxxxxxxxxxxxxxxxxx"
        );
    }

    #[test]
    fn test_locator_accepts_ids_and_channel_urls() {
        let source = source();
        let expected = format!(
            "https://www.youtube.com/feeds/videos.xml?channel_id={}",
            CHANNEL
        );

        assert_eq!(source.locator(CHANNEL).unwrap(), expected);
        assert_eq!(
            source
                .locator(&format!("https://www.youtube.com/channel/{}", CHANNEL))
                .unwrap(),
            expected
        );
    }

    #[test]
    fn test_locator_rejects_malformed_ids() {
        let err = source().locator("not-a-channel").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(source().locator("https://youtube.com/@handle").is_err());
    }

    #[test]
    fn test_extract_video_id_shapes() {
        let cases = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ?si=abc",
        ];

        for url in cases {
            assert_eq!(
                YouTubeSource::extract_video_id(url).as_deref(),
                Some("dQw4w9WgXcQ"),
                "URL {} should yield a video ID",
                url
            );
        }

        assert!(YouTubeSource::extract_video_id("https://www.youtube.com/post/Ugkxabc").is_none());
        assert!(YouTubeSource::extract_video_id("https://example.com/watch?v=dQw4w9WgXcQ").is_none());
    }

    #[test]
    fn test_parse_maps_entries_in_feed_order() {
        let items = source().parse(CHANNEL, SAMPLE_FEED).unwrap();

        assert_eq!(items.len(), 2, "duplicate entry IDs are collapsed");

        match &items[0] {
            SourceItem::Video(video) => {
                assert_eq!(video.title, "First video");
                assert_eq!(video.external_id, "yt:video:dQw4w9WgXcQ");
                assert_eq!(video.video_id.as_deref(), Some("dQw4w9WgXcQ"));
                assert_eq!(video.channel_id, CHANNEL);
                assert_eq!(video.description.as_deref(), Some("All about the first video"));
                assert_eq!(video.published_at.to_rfc3339(), "2024-01-15T10:00:00+00:00");
                assert!(video.transcript.is_none());
            }
            other => panic!("expected a video, got {:?}", other),
        }
    }

    #[test]
    fn test_unmatched_link_keeps_item_without_video_id() {
        let items = source().parse(CHANNEL, SAMPLE_FEED).unwrap();

        assert_eq!(items[1].title(), "Community post");
        match &items[1] {
            SourceItem::Video(video) => assert!(video.video_id.is_none()),
            other => panic!("expected a video, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_payload_is_parse_failure() {
        let err = source().parse(CHANNEL, "<html><body>oops").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailed);
    }

    #[tokio::test]
    async fn test_enrich_without_video_id_is_unavailable() {
        let source = source();
        let items = source.parse(CHANNEL, SAMPLE_FEED).unwrap();

        let outcome = source.enrich(&items[1]).await;
        assert!(matches!(outcome, Enrichment::Unavailable(_)));
    }
}
