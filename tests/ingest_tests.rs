use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ingestor::config::IngestConfig;
use ingestor::domain::{AdapterKind, AdapterResult, ItemCore, SourceConfig, SourceItem};
use ingestor::errors::ErrorKind;
use ingestor::services::{IngestService, ServiceOptions};
use ingestor::sources::{AdapterOptions, HttpFetcher, SourceAdapter, SourceRegistry};
use ingestor::storage::{ContentKind, FileCacheStore};

const CHANNEL: &str = "UC_x5XG1OV2P6uZZ5FSM9Ttw";

const TRANSCRIPT_VTT: &str = "WEBVTT
Kind: captions
Language: en

00:00:00.000 --> 00:00:02.000
Hello and welcome

00:00:02.000 --> 00:00:04.000
to the channel
";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 18, 12, 0, 0).unwrap()
}

fn youtube_feed(videos: &[(&str, DateTime<Utc>)]) -> String {
    let entries: String = videos
        .iter()
        .map(|(video_id, published)| {
            format!(
                r#"  <entry>
    <id>yt:video:{id}</id>
    <title>Video {id}</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v={id}"/>
    <published>{published}</published>
    <updated>{published}</updated>
  </entry>
"#,
                id = video_id,
                published = published.to_rfc3339()
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns="http://www.w3.org/2005/Atom">
  <id>yt:channel:{channel}</id>
  <title>Test channel</title>
{entries}</feed>"#,
        channel = CHANNEL,
        entries = entries
    )
}

fn rss_feed(items: &[(&str, &str, DateTime<Utc>)]) -> String {
    let entries: String = items
        .iter()
        .map(|(title, link, published)| {
            format!(
                r#"    <item>
      <title>{title}</title>
      <link>{link}</link>
      <guid>{link}</guid>
      <pubDate>{published}</pubDate>
    </item>
"#,
                title = title,
                link = link,
                published = published.to_rfc2822()
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test news</title>
    <link>https://example.com/</link>
    <description>News</description>
{}  </channel>
</rss>"#,
        entries
    )
}

struct Harness {
    _cache_dir: TempDir,
    cache: Arc<FileCacheStore>,
    registry_options: AdapterOptions,
}

impl Harness {
    fn new(server: &MockServer, cache_enabled: bool) -> Self {
        let cache_dir = TempDir::new().unwrap();
        let cache = Arc::new(FileCacheStore::new(cache_dir.path().join("cache"), cache_enabled));
        Self {
            _cache_dir: cache_dir,
            cache,
            registry_options: AdapterOptions {
                youtube_base_url: server.uri(),
                ..AdapterOptions::default()
            },
        }
    }

    fn registry(&self) -> SourceRegistry {
        let fetcher = HttpFetcher::new(self.cache.clone(), Duration::from_secs(5));
        SourceRegistry::new(fetcher, &self.registry_options)
    }

    fn service(&self) -> IngestService {
        IngestService::new(self.registry(), ServiceOptions::default())
    }
}

fn items(result: &AdapterResult) -> &[SourceItem] {
    result.items().expect("source should have succeeded")
}

async fn mount_channel_feed(server: &MockServer, body: String, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/feeds/videos.xml"))
        .and(query_param("channel_id", CHANNEL))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_youtube_window_and_transcripts() {
    let server = MockServer::start().await;
    let feed = youtube_feed(&[
        ("video000001", now() - ChronoDuration::hours(1)),
        ("video000002", now() - ChronoDuration::hours(23) - ChronoDuration::minutes(59)),
        ("video000003", now() - ChronoDuration::hours(25)),
    ]);
    mount_channel_feed(&server, feed, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/timedtext"))
        .and(query_param("v", "video000001"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TRANSCRIPT_VTT))
        .mount(&server)
        .await;
    // video000002 has no captions: the server answers 404

    let harness = Harness::new(&server, true);
    let config = IngestConfig::new(
        vec![SourceConfig::new("youtube", AdapterKind::YouTube, vec![CHANNEL.to_string()])],
        24,
    );

    let run = harness.service().run_all_at(&config, now()).await.unwrap();
    let videos = items(run.get("youtube").unwrap());

    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].external_id(), "yt:video:video000001");
    assert_eq!(videos[1].external_id(), "yt:video:video000002");

    match (&videos[0], &videos[1]) {
        (SourceItem::Video(first), SourceItem::Video(second)) => {
            assert_eq!(first.channel_id, CHANNEL);
            assert_eq!(first.video_id.as_deref(), Some("video000001"));
            let transcript = first.transcript.as_deref().unwrap();
            assert!(transcript.contains("Hello and welcome"));
            assert!(transcript.contains("to the channel"));
            assert!(second.transcript.is_none());
        }
        other => panic!("expected videos, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cached_payload_served_without_refetch() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_channel_feed(&server, youtube_feed(&[("video000001", now())]), 1).await;

    let harness = Harness::new(&server, true);
    let adapter = harness
        .registry()
        .find(AdapterKind::YouTube)
        .ok_or_else(|| anyhow::anyhow!("youtube adapter not registered"))?;
    let locator = adapter.locator(CHANNEL)?;

    let first = adapter.fetch_raw(&locator).await?;
    let second = adapter.fetch_raw(&locator).await?;

    assert_eq!(first, second);
    assert!(harness.cache.path_for(&locator, ContentKind::Feed).exists());
    Ok(())
}

#[tokio::test]
async fn test_disabled_cache_always_fetches() {
    let server = MockServer::start().await;
    mount_channel_feed(&server, youtube_feed(&[("video000001", now())]), 2).await;

    let harness = Harness::new(&server, false);
    let adapter = harness.registry().find(AdapterKind::YouTube).unwrap();
    let locator = adapter.locator(CHANNEL).unwrap();

    adapter.fetch_raw(&locator).await.unwrap();
    adapter.fetch_raw(&locator).await.unwrap();

    assert!(!harness.cache.dir().exists());
}

#[tokio::test]
async fn test_transcript_server_error_keeps_item() {
    let server = MockServer::start().await;
    mount_channel_feed(&server, youtube_feed(&[("video000001", now())]), 1).await;
    Mock::given(method("GET"))
        .and(path("/api/timedtext"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, false);
    let config = IngestConfig::new(
        vec![SourceConfig::new("youtube", AdapterKind::YouTube, vec![CHANNEL.to_string()])],
        24,
    );

    let run = harness.service().run_all_at(&config, now()).await.unwrap();
    let videos = items(run.get("youtube").unwrap());

    assert_eq!(videos.len(), 1);
    assert!(videos[0].enriched_text().is_none());
}

#[tokio::test]
async fn test_rss_articles_enriched_with_page_body() {
    let server = MockServer::start().await;
    let feed = rss_feed(&[
        (
            "Introducing the new model",
            &format!("{}/news/new-model", server.uri()),
            now() - ChronoDuration::hours(2),
        ),
        (
            "Removed announcement",
            &format!("{}/news/removed", server.uri()),
            now() - ChronoDuration::hours(3),
        ),
        (
            "Last month's recap",
            &format!("{}/news/recap", server.uri()),
            now() - ChronoDuration::days(30),
        ),
    ]);

    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/news/new-model"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><nav>Menu</nav><article><h1>New model</h1><p>It is faster.</p></article></body></html>",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/news/recap"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>old</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let harness = Harness::new(&server, true);
    let config = IngestConfig::new(
        vec![SourceConfig::new(
            "anthropic",
            AdapterKind::Rss,
            vec![format!("{}/feed.xml", server.uri())],
        )],
        24,
    );

    let run = harness.service().run_all_at(&config, now()).await.unwrap();
    let articles = items(run.get("anthropic").unwrap());

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].title(), "Introducing the new model");
    let body = articles[0].enriched_text().unwrap();
    assert!(body.contains("It is faster."));
    assert!(!body.contains("Menu"));
    assert!(articles[1].enriched_text().is_none());
}

#[tokio::test]
async fn test_html_index_end_to_end() {
    let server = MockServer::start().await;
    let index = r#"<html><body>
      <a href="/index/launching-agents-platform/">Launching the agents platform Company Jan 18, 2026</a>
      <a href="/index/older-story/">An older story that is out of range Dec 1, 2025</a>
    </body></html>"#;

    Mock::given(method("GET"))
        .and(path("/news/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/index/launching-agents-platform/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><main><p>Agents are now generally available.</p></main></body></html>",
        ))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, false);
    let config = IngestConfig::new(
        vec![SourceConfig::new(
            "openai",
            AdapterKind::Html,
            vec![format!("{}/news/", server.uri())],
        )],
        24,
    );

    let run = harness.service().run_all_at(&config, now()).await.unwrap();
    let articles = items(run.get("openai").unwrap());

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].title(), "Launching the agents platform");
    assert_eq!(
        articles[0].url(),
        format!("{}/index/launching-agents-platform/", server.uri())
    );
    assert!(articles[0]
        .enriched_text()
        .unwrap()
        .contains("Agents are now generally available."));
}

#[tokio::test]
async fn test_html_relative_dates_use_run_instant() {
    let server = MockServer::start().await;
    let index = r#"<html><body>
      <div><a href="/index/fresh-story/">A fresh story from this morning 2 hours ago</a></div>
      <div><a href="/index/stale-story/">A stale story from earlier this week 3 days ago</a></div>
    </body></html>"#;

    Mock::given(method("GET"))
        .and(path("/news/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, false);
    let config = IngestConfig::new(
        vec![SourceConfig::new(
            "openai",
            AdapterKind::Html,
            vec![format!("{}/news/", server.uri())],
        )],
        24,
    );

    let run = harness.service().run_all_at(&config, now()).await.unwrap();
    let articles = items(run.get("openai").unwrap());

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].title(), "A fresh story from this morning");
    assert_eq!(articles[0].published_at(), now() - ChronoDuration::hours(2));
}

#[tokio::test]
async fn test_failing_source_isolated_from_others() {
    let server = MockServer::start().await;
    mount_channel_feed(
        &server,
        youtube_feed(&[("video000001", now() - ChronoDuration::hours(1))]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/garbage.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("definitely not xml"))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, false);
    let config = IngestConfig::new(
        vec![
            SourceConfig::new("youtube", AdapterKind::YouTube, vec![CHANNEL.to_string()]),
            SourceConfig::new(
                "broken",
                AdapterKind::Rss,
                vec![format!("{}/broken.xml", server.uri())],
            ),
            SourceConfig::new(
                "garbage",
                AdapterKind::Rss,
                vec![format!("{}/garbage.xml", server.uri())],
            ),
        ],
        24,
    );

    let run = harness.service().run_all_at(&config, now()).await.unwrap();

    assert_eq!(items(run.get("youtube").unwrap()).len(), 1);
    assert_eq!(
        run.get("broken").unwrap().failure_kind(),
        Some(ErrorKind::FetchFailed)
    );
    assert_eq!(
        run.get("garbage").unwrap().failure_kind(),
        Some(ErrorKind::ParseFailed)
    );
    assert_eq!(run.failed_sources(), vec!["broken", "garbage"]);
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky.xml"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let harness = Harness::new(&server, true);
    let adapter = harness.registry().find(AdapterKind::Rss).unwrap();
    let locator = format!("{}/flaky.xml", server.uri());

    assert!(adapter.fetch_raw(&locator).await.is_err());
    assert!(adapter.fetch_raw(&locator).await.is_err());
    assert!(!harness.cache.path_for(&locator, ContentKind::Feed).exists());
}

#[tokio::test]
async fn test_repeated_cached_runs_are_identical() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let feed = youtube_feed(&[
        ("video000001", now() - ChronoDuration::hours(1)),
        ("video000002", now() - ChronoDuration::hours(5)),
    ]);
    mount_channel_feed(&server, feed, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/timedtext"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TRANSCRIPT_VTT))
        .expect(2)
        .mount(&server)
        .await;

    let harness = Harness::new(&server, true);
    let service = harness.service();
    let config = IngestConfig::new(
        vec![SourceConfig::new("youtube", AdapterKind::YouTube, vec![CHANNEL.to_string()])],
        24,
    );

    let first = service.run_all_at(&config, now()).await?;
    let second = service.run_all_at(&config, now()).await?;

    assert_eq!(first, second);
    assert_eq!(serde_json::to_string(&first)?, serde_json::to_string(&second)?);
    Ok(())
}
