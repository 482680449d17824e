use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::domain::{AdapterKind, Enrichment, NewsArticle, SourceItem};
use crate::errors::{IngestError, IngestResult};
use crate::sources::article::fetch_article_body;
use crate::sources::http::HttpFetcher;
use crate::sources::markdown::truncate_chars;
use crate::sources::rss::validate_http_url;
use crate::sources::traits::SourceAdapter;
use crate::storage::ContentKind;

const MIN_TITLE_CHARS: usize = 15;
const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 500;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));
static TIME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time[datetime]").expect("valid selector"));
static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4").expect("valid selector"));
static DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"p, [class*="description"], [class*="excerpt"]"#).expect("valid selector")
});

// "Jan 18, 2026", "January 18, 2026", "Sept. 3, 2025"
static TEXT_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2}),\s+(\d{4})\b")
        .expect("valid regex")
});

// "18 January 2026", "18 Jan 2026"
static DAY_FIRST_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{4})\b")
        .expect("valid regex")
});

// "2 hours ago", "1 week ago"
static RELATIVE_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,4})\s*(minute|hour|day|week)s?\s+ago\b").expect("valid regex")
});

// Product and section names that show up as link text on index pages.
static LABEL_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(gpt-?[0-9.]+|o[0-9](-mini)?|sora|dall-?e|whisper|codex|research|api|chatgpt|safety|products?|company|announcements?|[0-9]+)$",
    )
    .expect("valid regex")
});

static CATEGORY_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*\b(research|company|safety|product|api|chatgpt|announcements?)\s*$")
        .expect("valid regex")
});

/// News index pages without a feed; each dated link is one article.
pub struct HtmlIndexSource {
    fetcher: HttpFetcher,
}

impl HtmlIndexSource {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self { fetcher }
    }

    fn resolve_link(base: &Url, href: &str) -> Option<Url> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let mut resolved = base.join(href).ok()?;
        if !matches!(resolved.scheme(), "http" | "https") {
            return None;
        }
        resolved.set_fragment(None);

        // section landing pages, not articles
        if resolved.path().trim_end_matches('/').ends_with("/index") {
            return None;
        }
        Some(resolved)
    }

    fn article_from_anchor(
        anchor: ElementRef<'_>,
        url: &str,
        now: DateTime<Utc>,
    ) -> Option<NewsArticle> {
        let text = element_text(anchor);
        let date_match = find_text_date(&text, now);

        let published_at = anchor
            .select(&TIME_SELECTOR)
            .find_map(|t| t.value().attr("datetime").and_then(parse_datetime_attr))
            .or_else(|| date_match.map(|(_, date)| date))?;

        let mut category = None;
        let title = match anchor.select(&HEADING_SELECTOR).next() {
            Some(heading) => element_text(heading),
            None => {
                let before_date = match date_match {
                    Some((start, _)) => &text[..start],
                    None => text.as_str(),
                };
                match CATEGORY_SUFFIX_RE.captures(before_date) {
                    Some(caps) => {
                        category = caps.get(1).map(|c| c.as_str().to_string());
                        CATEGORY_SUFFIX_RE.replace(before_date, "").trim().to_string()
                    }
                    None => before_date.trim().to_string(),
                }
            }
        };

        if title.chars().count() < MIN_TITLE_CHARS {
            debug!(url, title = %title, "skipping short link text");
            return None;
        }
        if is_section_label(&title) {
            debug!(url, title = %title, "skipping section label");
            return None;
        }

        let description = find_description(anchor)
            .map(|d| truncate_chars(&d, MAX_DESCRIPTION_CHARS));

        Some(
            NewsArticle::new(
                url.to_string(),
                truncate_chars(&title, MAX_TITLE_CHARS),
                url.to_string(),
                published_at,
            )
            .with_description(description)
            .with_category(category),
        )
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_datetime_attr(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    date_at_midnight(value, "%Y-%m-%d")
}

fn date_at_midnight(value: &str, format: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Earliest date mentioned in `text` and its byte offset. Relative dates
/// count back from `now`.
fn find_text_date(text: &str, now: DateTime<Utc>) -> Option<(usize, DateTime<Utc>)> {
    let month_first = TEXT_DATE_RE.captures_iter(text).find_map(|caps| {
        let start = caps.get(0)?.start();
        let normalized = format!("{} {}, {}", &caps[1], &caps[2], &caps[3]);
        date_at_midnight(&normalized, "%b %d, %Y").map(|d| (start, d))
    });
    let day_first = DAY_FIRST_DATE_RE.captures_iter(text).find_map(|caps| {
        let start = caps.get(0)?.start();
        let normalized = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
        date_at_midnight(&normalized, "%d %b %Y").map(|d| (start, d))
    });
    let relative = RELATIVE_DATE_RE.captures(text).and_then(|caps| {
        let amount: i64 = caps[1].parse().ok()?;
        let ago = match caps[2].to_ascii_lowercase().as_str() {
            "minute" => Duration::minutes(amount),
            "hour" => Duration::hours(amount),
            "day" => Duration::days(amount),
            _ => Duration::weeks(amount),
        };
        Some((caps.get(0)?.start(), now - ago))
    });

    [month_first, day_first, relative]
        .into_iter()
        .flatten()
        .min_by_key(|(start, _)| *start)
}

fn is_section_label(title: &str) -> bool {
    title.split_whitespace().all(|word| LABEL_WORD_RE.is_match(word))
}

fn is_card_container(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    matches!(value.name(), "article" | "div" | "li")
        || value
            .attr("class")
            .map(|class| class.contains("card") || class.contains("item"))
            .unwrap_or(false)
}

// First paragraph inside the anchor, else in the nearest enclosing card only.
fn find_description(anchor: ElementRef<'_>) -> Option<String> {
    let own = anchor.select(&DESCRIPTION_SELECTOR).next();
    let from_card = || {
        anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(is_card_container)
            .and_then(|card| card.select(&DESCRIPTION_SELECTOR).next())
    };

    own.or_else(from_card)
        .map(element_text)
        .filter(|text| !text.is_empty())
}

#[async_trait]
impl SourceAdapter for HtmlIndexSource {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Html
    }

    fn locator(&self, param: &str) -> IngestResult<String> {
        validate_http_url(param)
    }

    async fn fetch_raw(&self, locator: &str) -> IngestResult<String> {
        self.fetcher.fetch(locator, ContentKind::Html).await
    }

    fn parse(&self, param: &str, raw: &str) -> IngestResult<Vec<SourceItem>> {
        self.parse_at(param, raw, Utc::now())
    }

    fn parse_at(
        &self,
        param: &str,
        raw: &str,
        now: DateTime<Utc>,
    ) -> IngestResult<Vec<SourceItem>> {
        if raw.trim().is_empty() {
            return Err(IngestError::PageParse("empty page".to_string()));
        }
        let base = Url::parse(param.trim())
            .map_err(|e| IngestError::InvalidUrl(format!("{}: {}", param, e)))?;

        let document = Html::parse_document(raw);
        let mut seen = HashSet::new();
        let mut articles = Vec::new();

        for anchor in document.select(&ANCHOR_SELECTOR) {
            let Some(resolved) = anchor
                .value()
                .attr("href")
                .and_then(|href| Self::resolve_link(&base, href))
            else {
                continue;
            };
            let url = resolved.to_string();
            if seen.contains(&url) {
                continue;
            }

            if let Some(article) = Self::article_from_anchor(anchor, &url, now) {
                seen.insert(url);
                articles.push(article.into());
            }
        }

        Ok(articles)
    }

    async fn enrich(&self, item: &SourceItem) -> Enrichment {
        fetch_article_body(&self.fetcher, item).await
    }
}
