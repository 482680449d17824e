use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields every normalized item exposes, whatever adapter produced it.
pub trait ItemCore {
    fn title(&self) -> &str;
    fn url(&self) -> &str;
    /// Unique within one adapter's output for one run.
    fn external_id(&self) -> &str;
    fn published_at(&self) -> DateTime<Utc>;
    fn description(&self) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelVideo {
    pub title: String,
    pub url: String,
    pub external_id: String,
    pub published_at: DateTime<Utc>,
    pub description: Option<String>,
    pub channel_id: String,
    /// Absent when the link matched none of the known URL shapes.
    pub video_id: Option<String>,
    pub transcript: Option<String>,
}

impl ChannelVideo {
    pub fn new(
        external_id: String,
        title: String,
        url: String,
        published_at: DateTime<Utc>,
        channel_id: String,
    ) -> Self {
        Self {
            title,
            url,
            external_id,
            published_at,
            description: None,
            channel_id,
            video_id: None,
            transcript: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_video_id(mut self, video_id: Option<String>) -> Self {
        self.video_id = video_id;
        self
    }

    pub fn with_transcript(mut self, transcript: Option<String>) -> Self {
        self.transcript = transcript;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub external_id: String,
    pub published_at: DateTime<Utc>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    /// Full content, markdown-normalized.
    pub body_text: Option<String>,
}

impl NewsArticle {
    pub fn new(
        external_id: String,
        title: String,
        url: String,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title,
            url,
            external_id,
            published_at,
            description: None,
            category: None,
            author: None,
            body_text: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }

    pub fn with_body_text(mut self, body_text: Option<String>) -> Self {
        self.body_text = body_text;
        self
    }
}

/// A normalized item, one variant per adapter family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceItem {
    Video(ChannelVideo),
    Article(NewsArticle),
}

impl SourceItem {
    fn core(&self) -> &dyn ItemCore {
        match self {
            SourceItem::Video(video) => video,
            SourceItem::Article(article) => article,
        }
    }

    pub fn body_text(&self) -> Option<&str> {
        match self {
            SourceItem::Article(article) => article.body_text.as_deref(),
            SourceItem::Video(_) => None,
        }
    }

    pub fn supplementary_text(&self) -> Option<&str> {
        match self {
            SourceItem::Video(video) => video.transcript.as_deref(),
            SourceItem::Article(_) => None,
        }
    }

    /// The optional text enrichment is responsible for, whichever field that is.
    pub fn enriched_text(&self) -> Option<&str> {
        self.body_text().or_else(|| self.supplementary_text())
    }

    /// Stores enrichment output in the variant's optional text field.
    pub fn with_enriched_text(self, text: Option<String>) -> Self {
        match self {
            SourceItem::Video(video) => SourceItem::Video(video.with_transcript(text)),
            SourceItem::Article(article) => SourceItem::Article(article.with_body_text(text)),
        }
    }
}

impl ItemCore for ChannelVideo {
    fn title(&self) -> &str {
        &self.title
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn external_id(&self) -> &str {
        &self.external_id
    }

    fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl ItemCore for NewsArticle {
    fn title(&self) -> &str {
        &self.title
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn external_id(&self) -> &str {
        &self.external_id
    }

    fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl ItemCore for SourceItem {
    fn title(&self) -> &str {
        self.core().title()
    }

    fn url(&self) -> &str {
        self.core().url()
    }

    fn external_id(&self) -> &str {
        self.core().external_id()
    }

    fn published_at(&self) -> DateTime<Utc> {
        self.core().published_at()
    }

    fn description(&self) -> Option<&str> {
        self.core().description()
    }
}

impl From<ChannelVideo> for SourceItem {
    fn from(video: ChannelVideo) -> Self {
        SourceItem::Video(video)
    }
}

impl From<NewsArticle> for SourceItem {
    fn from(article: NewsArticle) -> Self {
        SourceItem::Article(article)
    }
}
