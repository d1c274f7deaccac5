use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use wcag_core::types::generate_slug;
use wcag_core::{
    AppConfig, Article, BlogPost, Error, FactChecker, PostGenerator, PostStore, Result,
    Revalidator, SourceRef,
};

use crate::extractor::ArticleExtractor;
use crate::logging::Logger;

/// Articles passed to the generator per run.
pub const MAX_GENERATION_ARTICLES: usize = 3;

const EXCERPT_CHARS: usize = 300;
const PREVIEW_CHARS: usize = 300;
const DRY_RUN_TITLE: &str = "Test Blog Post";
const DEFAULT_TAGS: &[&str] = &["accessibility", "wcag", "news", "roundup"];

lazy_static! {
    static ref TITLE_LINE: Regex = Regex::new(r"(?m)^#[ \t]+(.+)$").unwrap();
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub max_articles: usize,
    pub auto_publish: bool,
    pub tags: Vec<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_articles: MAX_GENERATION_ARTICLES,
            auto_publish: false,
            tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            auto_publish: config.auto_publish,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    NoArticles,
    Created {
        post: BlogPost,
        articles_count: usize,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub title: String,
    pub source: String,
    pub url: String,
    pub published_date: DateTime<Utc>,
}

impl From<&Article> for ArticleSummary {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            source: article.source.clone(),
            url: article.url.clone(),
            published_date: article.published_date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub success: bool,
    pub article_count: usize,
    pub articles: Vec<ArticleSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub success: bool,
    pub content_length: usize,
    pub preview: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckReport {
    pub success: bool,
    pub verified: bool,
    pub notes: String,
}

/// What a dry run exercised. Later stages are `None` when they were skipped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunReport {
    pub extraction: ExtractionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact_check: Option<FactCheckReport>,
    pub message: String,
}

/// Extract, generate, fact-check, store and revalidate. One run at a time.
pub struct BlogPipeline {
    extractor: Arc<dyn ArticleExtractor>,
    generator: Arc<dyn PostGenerator>,
    fact_checker: Arc<dyn FactChecker>,
    posts: Arc<dyn PostStore>,
    revalidators: Vec<Arc<dyn Revalidator>>,
    options: PipelineOptions,
    running: Mutex<()>,
    logger: Logger,
}

impl BlogPipeline {
    pub fn new(
        extractor: Arc<dyn ArticleExtractor>,
        generator: Arc<dyn PostGenerator>,
        fact_checker: Arc<dyn FactChecker>,
        posts: Arc<dyn PostStore>,
    ) -> Self {
        Self {
            extractor,
            generator,
            fact_checker,
            posts,
            revalidators: Vec::new(),
            options: PipelineOptions::default(),
            running: Mutex::new(()),
            logger: Logger::new().with_prefix("[pipeline]".to_string()),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_revalidator(mut self, revalidator: Arc<dyn Revalidator>) -> Self {
        self.revalidators.push(revalidator);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    pub async fn run(&self) -> Result<PipelineOutcome> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| Error::Busy("Blog generation is already in progress".to_string()))?;

        self.logger.info("Starting blog generation process...");

        self.logger.info("Step 1: Extracting articles...");
        let articles = self.extractor.extract().await?;
        if articles.is_empty() {
            self.logger.info("No articles found in the last 48 hours");
            return Ok(PipelineOutcome::NoArticles);
        }
        let articles_count = articles.len();
        self.logger.info(&format!("Found {} articles", articles_count));

        let batch: Vec<Article> = articles
            .into_iter()
            .take(self.options.max_articles)
            .collect();

        self.logger.info("Step 2: Generating blog post...");
        let generated = self.generator.generate_post(&batch).await.map_err(|e| {
            self.logger.error(&format!("Blog generation failed: {}", e));
            e
        })?;

        let now = Utc::now();
        let (title, content) = split_title(&generated, now);
        let slug = self.unused_slug(&title, now).await?;

        self.logger.info("Step 3: Fact-checking blog post...");
        let fact_check = self
            .fact_checker
            .fact_check(&content, &title)
            .await
            .map_err(|e| {
                self.logger.error(&format!("Fact-check failed: {}", e));
                e
            })?;

        let is_published = self.options.auto_publish && fact_check.verified;
        let post = BlogPost {
            slug,
            title,
            excerpt: make_excerpt(&content),
            content,
            published_at: now,
            generated_at: now,
            sources: batch.iter().map(SourceRef::from).collect(),
            fact_check_status: fact_check.status(),
            fact_check_notes: Some(fact_check.notes),
            is_published,
            tags: self.options.tags.clone(),
        };

        self.logger.info("Step 4: Saving blog post...");
        let post = self.posts.save(&post).await.map_err(|e| {
            self.logger.error(&format!("Failed to save blog post: {}", e));
            e
        })?;

        self.logger.info("Step 5: Triggering revalidation...");
        self.revalidate(&post.slug).await;

        self.logger
            .info(&format!("Blog post created successfully: {}", post.slug));
        Ok(PipelineOutcome::Created {
            post,
            articles_count,
        })
    }

    /// Runs the stages without storing anything. With `extraction_only` the
    /// models are never called.
    pub async fn dry_run(&self, extraction_only: bool) -> Result<DryRunReport> {
        self.logger.info("Testing article extraction...");
        let articles = self.extractor.extract().await?;
        let extraction = ExtractionReport {
            success: true,
            article_count: articles.len(),
            articles: articles
                .iter()
                .take(MAX_GENERATION_ARTICLES)
                .map(ArticleSummary::from)
                .collect(),
        };

        if extraction_only {
            return Ok(DryRunReport {
                extraction,
                generation: None,
                fact_check: None,
                message: "Test mode - extraction only".to_string(),
            });
        }

        if articles.is_empty() {
            return Ok(DryRunReport {
                extraction,
                generation: None,
                fact_check: None,
                message: "No articles found in last 48 hours".to_string(),
            });
        }

        self.logger.info("Testing blog generation...");
        let batch: Vec<Article> = articles
            .into_iter()
            .take(MAX_GENERATION_ARTICLES)
            .collect();
        let content = self.generator.generate_post(&batch).await?;
        let generation = GenerationReport {
            success: true,
            content_length: content.chars().count(),
            preview: content.chars().take(PREVIEW_CHARS).collect(),
        };

        self.logger.info("Testing fact-checking...");
        let result = self.fact_checker.fact_check(&content, DRY_RUN_TITLE).await?;

        Ok(DryRunReport {
            extraction,
            generation: Some(generation),
            fact_check: Some(FactCheckReport {
                success: true,
                verified: result.verified,
                notes: result.notes,
            }),
            message: "All tests passed! Blog generation system is working correctly.".to_string(),
        })
    }

    async fn unused_slug(&self, title: &str, now: DateTime<Utc>) -> Result<String> {
        let mut base = generate_slug(title);
        if base.is_empty() {
            base = generate_slug(&fallback_title(now));
        }

        let mut slug = base.clone();
        let mut counter = 1;
        while self.posts.exists(&slug).await? {
            slug = format!("{}-{}", base, counter);
            counter += 1;
        }
        Ok(slug)
    }

    async fn revalidate(&self, slug: &str) {
        let paths = ["/blog".to_string(), format!("/blog/{}", slug)];
        for revalidator in &self.revalidators {
            for path in &paths {
                if let Err(e) = revalidator.revalidate(path).await {
                    self.logger
                        .warn(&format!("Revalidation of {} failed (non-critical): {}", path, e));
                }
            }
        }
    }
}

pub fn fallback_title(now: DateTime<Utc>) -> String {
    format!("Accessibility News Roundup - {}", now.format("%B %-d, %Y"))
}

/// Splits the first `# heading` line off the generated text. Without one the
/// dated fallback title is used and the body is left untouched.
pub fn split_title(generated: &str, now: DateTime<Utc>) -> (String, String) {
    match TITLE_LINE.captures(generated) {
        Some(caps) => {
            let (Some(line), Some(title)) = (caps.get(0), caps.get(1)) else {
                return (fallback_title(now), generated.to_string());
            };
            let content = format!("{}{}", &generated[..line.start()], &generated[line.end()..]);
            (title.as_str().trim().to_string(), content.trim().to_string())
        }
        None => (fallback_title(now), generated.to_string()),
    }
}

pub fn make_excerpt(content: &str) -> String {
    let head: String = content.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", head.replace('\n', " "))
}
