use std::fmt;
use wcag_core::{Article, Error, FactCheckResult, FactChecker, PostGenerator, Result};

/// Offline model: stitches a post together from the article excerpts and
/// approves everything. Used with `--model dummy` and in tests.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PostGenerator for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate_post(&self, articles: &[Article]) -> Result<String> {
        if articles.is_empty() {
            return Err(Error::Generation(
                "No articles provided for blog generation".to_string(),
            ));
        }

        let mut post = String::from("## Introduction\n\n");
        for article in articles {
            // First 20 words of each article
            let words: Vec<&str> = article.content.split_whitespace().take(20).collect();
            post.push_str(&format!("### {}\n\n{}\n\n", article.title, words.join(" ")));
        }
        post.push_str("## Sources\n\n");
        for article in articles {
            post.push_str(&format!("- [{}]({}) ({})\n", article.title, article.url, article.source));
        }
        Ok(post)
    }
}

#[async_trait::async_trait]
impl FactChecker for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn fact_check(&self, content: &str, _title: &str) -> Result<FactCheckResult> {
        Ok(FactCheckResult {
            verified: !content.trim().is_empty(),
            notes: "All facts verified".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_dummy_model() {
        let model = DummyModel::new();
        let article = Article {
            title: "Screen readers and PDFs".to_string(),
            url: "https://example.org/pdf".to_string(),
            source: "A11y Project".to_string(),
            published_date: Utc::now(),
            content: "Tagged PDFs let screen readers announce headings. Untagged files do not.".to_string(),
            excerpt: None,
        };

        let post = model.generate_post(&[article]).await.unwrap();
        assert!(post.contains("### Screen readers and PDFs"));
        assert!(post.contains("(https://example.org/pdf)"));

        let check = model.fact_check(&post, "Title").await.unwrap();
        assert!(check.verified);

        assert!(model.generate_post(&[]).await.is_err());
    }
}
