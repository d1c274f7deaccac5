use async_trait::async_trait;
use feed_rs::model::Entry;
use reqwest::Client;
use wcag_core::{Article, Error, Result};

use super::{fetch_page, is_off_topic, ArticleSource, RecencyWindow, MIN_CONTENT_LEN};
use crate::processor::{process_article_content, DEFAULT_EXCERPT_LEN};

/// An RSS or Atom feed. Every item links to a full article page which is
/// downloaded and reduced to its main text.
pub struct RssSource {
    name: String,
    url: String,
    client: Client,
}

impl RssSource {
    pub fn new(name: String, url: String, client: Client) -> Self {
        Self { name, url, client }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_feed(&self) -> Result<feed_rs::model::Feed> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to fetch feed {}: {}", self.url, e)))?;
        if !response.status().is_success() {
            return Err(Error::Fetch(format!(
                "Failed to fetch feed {}: HTTP {}",
                self.url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to read feed {}: {}", self.url, e)))?;
        feed_rs::parser::parse(&bytes[..])
            .map_err(|e| Error::Fetch(format!("Failed to parse feed {}: {}", self.url, e)))
    }

    async fn process_entry(&self, entry: Entry, window: &RecencyWindow) -> Option<Article> {
        let title = entry.title.map(|t| t.content.trim().to_string())?;
        let link = entry.links.first().map(|l| l.href.clone())?;
        if title.is_empty() || link.is_empty() {
            return None;
        }

        let published = entry.published.or(entry.updated)?;
        if !window.contains(published) {
            return None;
        }

        let html = fetch_page(&self.client, &link).await?;
        let processed = process_article_content(&html, &title);
        if processed.content.chars().count() < MIN_CONTENT_LEN {
            tracing::debug!("Skipping short article: {}", title);
            return None;
        }

        let summary = entry
            .summary
            .map(|s| s.content)
            .unwrap_or_default();
        if is_off_topic(&format!("{} {} {}", title, summary, processed.content)) {
            tracing::info!("Skipping non-accessibility article from RSS: {}", title);
            return None;
        }

        let excerpt = if processed.excerpt.is_empty() {
            summary.chars().take(DEFAULT_EXCERPT_LEN).collect()
        } else {
            processed.excerpt
        };

        Some(Article {
            title,
            url: link,
            source: self.name.clone(),
            published_date: published,
            content: processed.content,
            excerpt: Some(excerpt),
        })
    }
}

#[async_trait]
impl ArticleSource for RssSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_articles(&self, window: &RecencyWindow) -> Result<Vec<Article>> {
        let feed = self.fetch_feed().await?;
        tracing::debug!("{}: {} feed entries", self.name, feed.entries.len());

        let mut articles = Vec::new();
        for entry in feed.entries {
            if let Some(article) = self.process_entry(entry, window).await {
                articles.push(article);
            }
        }
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_support::{article_page, serve};
    use axum::{http::StatusCode, routing::get, Router};
    use chrono::{Duration, Utc};

    const LONG_BODY: &str = "WCAG 2.2 adds nine new success criteria covering focus appearance, \
        dragging movements, target size and accessible authentication for web content.";

    fn item(base: &str, path: &str, title: &str, age_hours: i64) -> String {
        let date = (Utc::now() - Duration::hours(age_hours)).to_rfc2822();
        format!(
            "<item><title>{}</title><link>{}{}</link><pubDate>{}</pubDate>\
             <description>Summary of {}</description></item>",
            title, base, path, date, title
        )
    }

    fn feed(items: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Test</title><link>http://localhost</link><description>d</description>{}</channel></rss>"#,
            items.join("")
        )
    }

    #[tokio::test]
    async fn test_fetches_recent_items() {
        let base = serve(|base| {
            let xml = feed(&[
                item(base, "/fresh", "Fresh WCAG news", 2),
                item(base, "/stale", "Old WCAG news", 72),
                item(base, "/short", "Short WCAG note", 1),
                item(base, "/missing", "Missing WCAG page", 1),
                item(base, "/crypto", "Bitcoin rally", 1),
            ]);
            Router::new()
                .route("/feed.xml", get(move || async move { xml }))
                .route("/fresh", get(|| async { article_page(LONG_BODY) }))
                .route("/stale", get(|| async { article_page(LONG_BODY) }))
                .route("/short", get(|| async { article_page("Too short.") }))
                .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
                .route(
                    "/crypto",
                    get(|| async {
                        article_page(
                            "Bitcoin and cryptocurrency markets rallied again this week as \
                             traders piled into speculative positions ahead of the halving event.",
                        )
                    }),
                )
        })
        .await;

        let source = RssSource::new(
            "Test Feed".to_string(),
            format!("{}/feed.xml", base),
            reqwest::Client::new(),
        );
        let articles = source
            .fetch_articles(&RecencyWindow::last_48_hours())
            .await
            .unwrap();

        assert_eq!(articles.len(), 1);
        let article = &articles[0];
        assert_eq!(article.title, "Fresh WCAG news");
        assert_eq!(article.url, format!("{}/fresh", base));
        assert_eq!(article.source, "Test Feed");
        assert!(article.content.starts_with("WCAG 2.2 adds nine"));
        assert!(!article.content.contains("menu"));
        assert!(article.excerpt.is_some());
    }

    #[tokio::test]
    async fn test_feed_errors_are_fetch_errors() {
        let base = serve(|_| {
            Router::new()
                .route("/broken", get(|| async { "not a feed" }))
                .route("/down", get(|| async { StatusCode::BAD_GATEWAY }))
        })
        .await;

        for path in ["/broken", "/down"] {
            let source = RssSource::new(
                "Broken".to_string(),
                format!("{}{}", base, path),
                reqwest::Client::new(),
            );
            let err = source
                .fetch_articles(&RecencyWindow::last_48_hours())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Fetch(_)), "{}: {:?}", path, err);
        }
    }
}
