use anyhow::{Context, Result};
use common::{Article, FetchConfig, NO_LINK, NO_SUMMARY, NO_TITLE};
use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Source of raw feed entries. The HTTP implementation is the only one used in production;
/// tests plug in their own.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the feed at `url` and return its entries in document order.
    async fn fetch_entries(&self, url: &str) -> Result<Vec<FeedEntry>>;
}

/// A feed entry with every field the article resolution looks at, each optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub content: Option<EntryContent>,
}

/// Entry content is either a bare value or a list of content objects, depending on the
/// feed dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryContent {
    Scalar(String),
    Sequence(Vec<ContentItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub value: String,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl EntryContent {
    /// Text of a scalar, or of the first element of a sequence.
    pub fn text(&self) -> Option<&str> {
        match self {
            EntryContent::Scalar(value) => Some(value.as_str()),
            EntryContent::Sequence(items) => items.first().map(|item| item.value.as_str()),
        }
    }
}

impl FeedEntry {
    /// Summary lookup order: `summary`, then `description`, then `content`.
    /// The first field that is present wins; blank strings count as absent.
    pub fn resolved_summary(&self) -> &str {
        if let Some(summary) = non_blank(self.summary.as_deref()) {
            return summary;
        }
        if let Some(description) = non_blank(self.description.as_deref()) {
            return description;
        }
        if let Some(content) = &self.content {
            return non_blank(content.text()).unwrap_or(NO_SUMMARY);
        }
        NO_SUMMARY
    }

    pub fn to_article(&self) -> Article {
        Article {
            title: non_blank(self.title.as_deref()).unwrap_or(NO_TITLE).to_string(),
            link: non_blank(self.link.as_deref()).unwrap_or(NO_LINK).to_string(),
            summary: self.resolved_summary().to_string(),
        }
    }
}

impl From<Entry> for FeedEntry {
    fn from(entry: Entry) -> Self {
        // Media RSS carries its own description next to the item summary
        let description = entry
            .media
            .iter()
            .find_map(|m| m.description.as_ref().map(|d| d.content.clone()));

        let content = entry.content.map(|c| {
            EntryContent::Sequence(c.body.into_iter().map(|value| ContentItem { value }).collect())
        });

        FeedEntry {
            title: entry.title.map(|t| t.content),
            link: entry.links.into_iter().next().map(|l| l.href),
            summary: entry.summary.map(|s| s.content),
            description,
            content,
        }
    }
}

/// Parse an RSS/Atom/JSON feed document into entries.
pub fn parse_entries(bytes: &[u8]) -> Result<Vec<FeedEntry>> {
    let feed = parser::parse(bytes).context("failed to parse feed")?;
    Ok(feed.entries.into_iter().map(FeedEntry::from).collect())
}

/// Fetches feeds over HTTP(S) with reqwest.
pub struct HttpFeedSource {
    client: Client,
    max_response_bytes: Option<u64>,
}

impl HttpFeedSource {
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            client,
            max_response_bytes: None,
        })
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        Ok(Self::new(config.timeout_seconds(), config.user_agent())?
            .with_max_response_bytes(config.max_response_bytes))
    }

    pub fn with_max_response_bytes(mut self, limit: Option<u64>) -> Self {
        self.max_response_bytes = limit;
        self
    }

    fn check_size(&self, len: u64) -> Result<()> {
        match self.max_response_bytes {
            Some(limit) if len > limit => Err(anyhow::anyhow!(
                "feed body of {} bytes exceeds the {} byte limit",
                len,
                limit
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_entries(&self, url: &str) -> Result<Vec<FeedEntry>> {
        let parsed = url::Url::parse(url).context("failed to parse feed URL")?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .context("failed to fetch feed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("feed fetch failed with status: {}", status));
        }

        if let Some(len) = response.content_length() {
            self.check_size(len)?;
        }

        let bytes = response.bytes().await.context("failed to read response body")?;
        self.check_size(bytes.len() as u64)?;
        debug!("ingestion: received {} bytes from {}", bytes.len(), url);

        parse_entries(bytes.as_ref())
    }
}

/// Fetch the feed at `url` and resolve every entry into an `Article`, keeping feed order.
/// An empty feed yields an empty vector; transport and parse failures are errors.
pub async fn fetch_articles(source: &dyn FeedSource, url: &str) -> Result<Vec<Article>> {
    let entries = source.fetch_entries(url).await?;
    let articles: Vec<Article> = entries.iter().map(FeedEntry::to_article).collect();
    info!("ingestion: {} articles resolved from {}", articles.len(), url);
    Ok(articles)
}
