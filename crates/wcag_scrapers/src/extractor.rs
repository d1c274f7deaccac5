use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashSet;
use wcag_core::{AppConfig, Article, Result};

use crate::logging::Logger;
use crate::sources::{sources_from_config, ArticleSource, RecencyWindow};

/// Upper bound on articles handed to the pipeline per run.
pub const MAX_EXTRACTED_ARTICLES: usize = 7;

#[async_trait]
pub trait ArticleExtractor: Send + Sync {
    /// Recent, deduplicated articles, newest first. Never fails because a
    /// single source did.
    async fn extract(&self) -> Result<Vec<Article>>;
}

pub struct Extractor {
    sources: Vec<Box<dyn ArticleSource>>,
    logger: Logger,
}

impl Extractor {
    pub fn new(sources: Vec<Box<dyn ArticleSource>>) -> Self {
        Self {
            sources,
            logger: Logger::new().with_prefix("[extract]".to_string()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(sources_from_config(config)?))
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn extract_window(&self, window: &RecencyWindow) -> Vec<Article> {
        self.logger
            .info(&format!("Extracting from {} sources", self.sources.len()));

        let results = join_all(
            self.sources
                .iter()
                .map(|source| source.fetch_articles(window)),
        )
        .await;

        let mut all = Vec::new();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(articles) => {
                    self.logger.info(&format!(
                        "Extracted {} articles from {}",
                        articles.len(),
                        source.name()
                    ));
                    all.extend(articles);
                }
                Err(e) => {
                    self.logger
                        .error(&format!("Failed to extract from {}: {}", source.name(), e));
                }
            }
        }

        let mut unique = deduplicate(all);
        self.logger.info(&format!(
            "Total unique accessibility articles extracted: {}",
            unique.len()
        ));

        unique.sort_by(|a, b| b.published_date.cmp(&a.published_date));
        unique.truncate(MAX_EXTRACTED_ARTICLES);
        for article in &unique {
            self.logger
                .debug(&format!("Keeping {} ({})", article.url, article.source));
        }
        unique
    }
}

#[async_trait]
impl ArticleExtractor for Extractor {
    async fn extract(&self) -> Result<Vec<Article>> {
        Ok(self.extract_window(&RecencyWindow::last_48_hours()).await)
    }
}

/// Keeps the first article seen for each case-insensitive, trimmed URL.
pub fn deduplicate(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| seen.insert(article.url.trim().to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use wcag_core::Error;

    fn article(url: &str, hours_ago: i64) -> Article {
        Article {
            title: format!("Article {}", url),
            url: url.to_string(),
            source: "Test".to_string(),
            published_date: Utc::now() - Duration::hours(hours_ago),
            content: "WCAG content".to_string(),
            excerpt: None,
        }
    }

    struct StaticSource {
        name: &'static str,
        articles: Vec<Article>,
    }

    #[async_trait]
    impl ArticleSource for StaticSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_articles(&self, _window: &RecencyWindow) -> Result<Vec<Article>> {
            Ok(self.articles.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ArticleSource for FailingSource {
        fn name(&self) -> &str {
            "Failing"
        }

        async fn fetch_articles(&self, _window: &RecencyWindow) -> Result<Vec<Article>> {
            Err(Error::Fetch("connection refused".to_string()))
        }
    }

    #[test]
    fn test_deduplicate_normalizes_urls() {
        let articles = vec![
            article("https://Example.org/a", 1),
            article(" https://example.org/a ", 2),
            article("https://example.org/b", 3),
        ];
        let unique = deduplicate(articles);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].url, "https://Example.org/a");
    }

    #[tokio::test]
    async fn test_failed_source_is_skipped() {
        let extractor = Extractor::new(vec![
            Box::new(FailingSource),
            Box::new(StaticSource {
                name: "Good",
                articles: vec![article("https://example.org/ok", 1)],
            }),
        ]);
        let articles = extractor.extract().await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].url, "https://example.org/ok");
    }

    #[tokio::test]
    async fn test_sorted_newest_first_and_capped() {
        let first: Vec<_> = (0..5)
            .map(|i| article(&format!("https://a.example/{}", i), 10 + i))
            .collect();
        let second: Vec<_> = (0..5)
            .map(|i| article(&format!("https://b.example/{}", i), i))
            .collect();
        let extractor = Extractor::new(vec![
            Box::new(StaticSource {
                name: "A",
                articles: first,
            }),
            Box::new(StaticSource {
                name: "B",
                articles: second,
            }),
        ]);

        let articles = extractor.extract().await.unwrap();
        assert_eq!(articles.len(), MAX_EXTRACTED_ARTICLES);
        assert_eq!(articles[0].url, "https://b.example/0");
        assert!(articles
            .windows(2)
            .all(|w| w[0].published_date >= w[1].published_date));
    }

    #[tokio::test]
    async fn test_no_sources_yields_nothing() {
        let extractor = Extractor::new(Vec::new());
        assert!(extractor.extract().await.unwrap().is_empty());
        assert!(extractor.source_names().is_empty());
    }
}
