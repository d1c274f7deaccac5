use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use wcag_core::{AppConfig, Article, Result};

pub mod newsapi;
pub mod rss;

pub use newsapi::NewsApiSource;
pub use rss::RssSource;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; TheWCAG Blog Generator/1.0; +https://thewcag.com)";

/// Articles older than this are ignored.
pub const RECENCY_HOURS: i64 = 48;

/// Extracted bodies shorter than this are treated as noise.
pub const MIN_CONTENT_LEN: usize = 100;

pub struct FeedDefinition {
    pub name: &'static str,
    pub url: &'static str,
}

pub const DEFAULT_RSS_FEEDS: &[FeedDefinition] = &[
    FeedDefinition {
        name: "A11y Project",
        url: "https://www.a11yproject.com/feed/",
    },
    FeedDefinition {
        name: "WebAIM Blog",
        url: "https://webaim.org/blog/feed/",
    },
    FeedDefinition {
        name: "Deque Blog",
        url: "https://www.deque.com/blog/feed/",
    },
    FeedDefinition {
        name: "Accessibility.com",
        url: "https://www.accessibility.com/blog/feed",
    },
];

const ACCESSIBILITY_KEYWORDS: &[&str] = &[
    "accessibility",
    "web accessibility",
    "wcag",
    "ada",
    "ada compliance",
    "americans with disabilities act",
    "section 508",
    "accessibility lawsuit",
    "ada lawsuit",
    "digital accessibility",
    "a11y",
    "assistive technology",
    "screen reader",
    "keyboard navigation",
    "aria",
    "inclusive design",
    "accessible design",
    "accessible website",
    "accessible web",
    "web content accessibility",
];

/// Topics that slip into accessibility feeds but aren't about accessibility.
const OFF_TOPIC_TERMS: &[&str] = &[
    "cybersecurity",
    "meat packaging",
    "food packaging",
    "stock market",
    "cryptocurrency",
    "bitcoin",
    "real estate",
    "automotive",
];

pub fn is_accessibility_related(text: &str) -> bool {
    let lower = text.to_lowercase();
    ACCESSIBILITY_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub fn is_off_topic(text: &str) -> bool {
    let lower = text.to_lowercase();
    OFF_TOPIC_TERMS.iter().any(|t| lower.contains(t)) && !is_accessibility_related(&lower)
}

/// The `[now - hours, now]` interval an article must fall in.
#[derive(Debug, Clone, Copy)]
pub struct RecencyWindow {
    pub now: DateTime<Utc>,
    pub hours: i64,
}

impl RecencyWindow {
    pub fn new(now: DateTime<Utc>, hours: i64) -> Self {
        Self { now, hours }
    }

    pub fn last_48_hours() -> Self {
        Self::new(Utc::now(), RECENCY_HOURS)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.now - Duration::hours(self.hours)
    }

    pub fn contains(&self, published: DateTime<Utc>) -> bool {
        published <= self.now && published >= self.start()
    }
}

#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Name of the news source, used for logging and as `Article::source`
    /// when the upstream doesn't provide one.
    fn name(&self) -> &str;

    /// Articles published inside `window`. Fails with `Error::Fetch` when
    /// the source itself can't be reached or parsed.
    async fn fetch_articles(&self, window: &RecencyWindow) -> Result<Vec<Article>>;
}

pub fn http_client() -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(30))
        .build()?)
}

/// Downloads an article page. Failures are logged and reported as `None`
/// so one broken link doesn't sink the whole source.
pub(crate) async fn fetch_page(client: &Client, url: &str) -> Option<String> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to fetch article content from {}: {}", url, e);
            return None;
        }
    };
    if !response.status().is_success() {
        tracing::warn!("Failed to fetch article content from {}: HTTP {}", url, response.status());
        return None;
    }
    match response.text().await {
        Ok(body) if !body.is_empty() => Some(body),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Failed to read article body from {}: {}", url, e);
            None
        }
    }
}

/// Every source enabled by `config`: the RSS feeds (`RSS_FEEDS` or the
/// defaults) plus News API when a key is configured.
pub fn sources_from_config(config: &AppConfig) -> Result<Vec<Box<dyn ArticleSource>>> {
    let client = http_client()?;
    let mut sources: Vec<Box<dyn ArticleSource>> = Vec::new();

    match &config.rss_feeds {
        Some(urls) => {
            for (i, url) in urls.iter().enumerate() {
                sources.push(Box::new(RssSource::new(
                    format!("Source {}", i + 1),
                    url.clone(),
                    client.clone(),
                )));
            }
        }
        None => {
            for feed in DEFAULT_RSS_FEEDS {
                sources.push(Box::new(RssSource::new(
                    feed.name.to_string(),
                    feed.url.to_string(),
                    client.clone(),
                )));
            }
        }
    }

    if let Some(api_key) = &config.news_api_key {
        sources.push(Box::new(NewsApiSource::new(api_key.clone(), client)));
    }

    Ok(sources)
}
