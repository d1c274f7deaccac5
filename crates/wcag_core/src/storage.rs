use async_trait::async_trait;
use crate::types::{BlogPost, BlogPostMetadata, LeaderboardStats, QuizScore};
use crate::Result;

/// Number of scores kept; older ones are dropped on write.
pub const MAX_STORED_SCORES: usize = 1000;

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Lookup ignores `is_published`; visibility is decided by callers.
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>>;

    /// All posts, most recently saved first.
    async fn get_all(&self) -> Result<Vec<BlogPostMetadata>>;

    async fn exists(&self, slug: &str) -> Result<bool>;

    /// Insert-only. Saving an existing slug fails with `Error::Conflict`.
    async fn save(&self, post: &BlogPost) -> Result<BlogPost>;

    async fn get_published(&self) -> Result<Vec<BlogPostMetadata>> {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .filter(|post| post.is_published)
            .collect())
    }
}

#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Fails with `Error::Validation` when `score < 0`, `score > total` or
    /// `total <= 0`.
    async fn save_score(&self, score: i64, total: i64, name: Option<&str>) -> Result<QuizScore>;

    async fn all_time_leaderboard(&self, limit: usize) -> Result<Vec<QuizScore>>;

    async fn daily_leaderboard(&self, limit: usize) -> Result<Vec<QuizScore>>;

    async fn leaderboard_stats(&self) -> Result<LeaderboardStats>;
}
