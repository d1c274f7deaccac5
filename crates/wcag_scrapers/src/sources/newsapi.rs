use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use wcag_core::{Article, Error, Result};

use super::{fetch_page, is_accessibility_related, ArticleSource, RecencyWindow, MIN_CONTENT_LEN};
use crate::processor::{process_article_content, DEFAULT_EXCERPT_LEN};

pub const NEWS_API_URL: &str = "https://newsapi.org/v2/everything";

const PAGE_SIZE: u32 = 20;

const QUERY_TERMS: &[&str] = &[
    "accessibility",
    "WCAG",
    "ADA compliance",
    "Section 508",
    "digital accessibility",
    "web accessibility",
    "a11y",
];

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
    source: Option<NewsApiSourceName>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSourceName {
    name: Option<String>,
}

/// Keyword search against the News API `everything` endpoint.
pub struct NewsApiSource {
    api_key: String,
    endpoint: String,
    client: Client,
}

impl NewsApiSource {
    pub fn new(api_key: String, client: Client) -> Self {
        Self {
            api_key,
            endpoint: NEWS_API_URL.to_string(),
            client,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn query() -> String {
        QUERY_TERMS.join(" OR ")
    }

    async fn search(&self, window: &RecencyWindow) -> Result<NewsApiResponse> {
        let from = window.start().to_rfc3339_opts(SecondsFormat::Millis, true);
        let page_size = PAGE_SIZE.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("q", Self::query().as_str()),
                ("language", "en"),
                ("sortBy", "relevancy"),
                ("from", from.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("News API request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Fetch(format!(
                "News API error: {}",
                response.status().as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Fetch(format!("Invalid News API response: {}", e)))
    }

    async fn process_item(&self, item: NewsApiArticle, window: &RecencyWindow) -> Option<Article> {
        let title = item.title.filter(|t| !t.trim().is_empty())?;
        let url = item.url.filter(|u| !u.trim().is_empty())?;
        let published = item
            .published_at
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc))?;
        if !window.contains(published) {
            return None;
        }

        let description = item.description.unwrap_or_default();
        if !is_accessibility_related(&format!("{} {}", title, description)) {
            tracing::info!("Skipping non-accessibility article: {}", title);
            return None;
        }

        let source = item
            .source
            .and_then(|s| s.name)
            .unwrap_or_else(|| self.name().to_string());
        let description_excerpt: String = description.chars().take(DEFAULT_EXCERPT_LEN).collect();

        let Some(html) = fetch_page(&self.client, &url).await else {
            if description.is_empty() || !is_accessibility_related(&description) {
                return None;
            }
            return Some(Article {
                title,
                url,
                source,
                published_date: published,
                content: description,
                excerpt: Some(description_excerpt),
            });
        };

        let processed = process_article_content(&html, &title);
        if processed.content.chars().count() < MIN_CONTENT_LEN {
            return None;
        }
        if !is_accessibility_related(&processed.content) {
            tracing::info!("Skipping article after content check: {}", title);
            return None;
        }

        let excerpt = if processed.excerpt.is_empty() {
            description_excerpt
        } else {
            processed.excerpt
        };
        Some(Article {
            title,
            url,
            source,
            published_date: published,
            content: processed.content,
            excerpt: Some(excerpt),
        })
    }
}

#[async_trait]
impl ArticleSource for NewsApiSource {
    fn name(&self) -> &str {
        "News API"
    }

    async fn fetch_articles(&self, window: &RecencyWindow) -> Result<Vec<Article>> {
        let response = self.search(window).await?;
        let mut articles = Vec::new();
        for item in response.articles {
            if let Some(article) = self.process_item(item, window).await {
                articles.push(article);
            }
        }
        Ok(articles)
    }
}
