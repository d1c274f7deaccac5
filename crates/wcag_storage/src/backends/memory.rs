use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use wcag_core::storage::MAX_STORED_SCORES;
use wcag_core::types::rank_scores;
use wcag_core::{
    BlogPost, BlogPostMetadata, Error, LeaderboardStats, PostStore, QuizScore, Result, ScoreStore,
};

use crate::{StorageBackend, StorageConfig};

#[derive(Default)]
pub struct MemoryStore {
    /// Newest first.
    posts: Vec<BlogPost>,
    /// Insertion order, oldest first.
    scores: Vec<QuizScore>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_post(&mut self, post: &BlogPost) -> Result<BlogPost> {
        if self.posts.iter().any(|p| p.slug == post.slug) {
            return Err(Error::Conflict(format!("Blog post already exists: {}", post.slug)));
        }
        self.posts.insert(0, post.clone());
        Ok(post.clone())
    }

    fn push_score(&mut self, score: QuizScore) {
        self.scores.push(score);
        if self.scores.len() > MAX_STORED_SCORES {
            let excess = self.scores.len() - MAX_STORED_SCORES;
            self.scores.drain(..excess);
        }
    }
}

pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn open(_config: &StorageConfig) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl PostStore for InMemoryStorage {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let store = self.store.read().await;
        Ok(store.posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn get_all(&self) -> Result<Vec<BlogPostMetadata>> {
        let store = self.store.read().await;
        Ok(store.posts.iter().map(BlogPost::metadata).collect())
    }

    async fn exists(&self, slug: &str) -> Result<bool> {
        let store = self.store.read().await;
        Ok(store.posts.iter().any(|p| p.slug == slug))
    }

    async fn save(&self, post: &BlogPost) -> Result<BlogPost> {
        let mut store = self.store.write().await;
        store.insert_post(post)
    }
}

#[async_trait]
impl ScoreStore for InMemoryStorage {
    async fn save_score(&self, score: i64, total: i64, name: Option<&str>) -> Result<QuizScore> {
        let entry = QuizScore::new(score, total, name)?;
        let mut store = self.store.write().await;
        store.push_score(entry.clone());
        Ok(entry)
    }

    async fn all_time_leaderboard(&self, limit: usize) -> Result<Vec<QuizScore>> {
        let store = self.store.read().await;
        Ok(rank_scores(store.scores.clone(), limit))
    }

    async fn daily_leaderboard(&self, limit: usize) -> Result<Vec<QuizScore>> {
        let today = Utc::now().date_naive();
        let store = self.store.read().await;
        let todays = store.scores.iter().filter(|s| s.date == today).cloned().collect();
        Ok(rank_scores(todays, limit))
    }

    async fn leaderboard_stats(&self) -> Result<LeaderboardStats> {
        let store = self.store.read().await;
        Ok(LeaderboardStats::from_scores(&store.scores, Utc::now().date_naive()))
    }
}
