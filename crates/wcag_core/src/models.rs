use async_trait::async_trait;
use crate::types::{Article, FactCheckResult};
use crate::Result;

/// Writes a long-form post from a batch of articles.
#[async_trait]
pub trait PostGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the generated markdown body. An empty batch is an error.
    async fn generate_post(&self, articles: &[Article]) -> Result<String>;
}

/// Reviews a generated post for factual accuracy.
#[async_trait]
pub trait FactChecker: Send + Sync {
    fn name(&self) -> &str;

    async fn fact_check(&self, content: &str, title: &str) -> Result<FactCheckResult>;
}
