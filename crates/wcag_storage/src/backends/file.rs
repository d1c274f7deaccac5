use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use wcag_core::storage::MAX_STORED_SCORES;
use wcag_core::types::rank_scores;
use wcag_core::{
    BlogPost, BlogPostMetadata, Error, LeaderboardStats, PostStore, QuizScore, Result, ScoreStore,
};

use crate::{StorageBackend, StorageConfig};

const POSTS_DIR: &str = "blog-posts";
const INDEX_FILE: &str = "index.json";
const SCORES_DIR: &str = "quiz-scores";
const SCORES_FILE: &str = "scores.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ScoresData {
    scores: Vec<QuizScore>,
}

/// JSON files on disk: one file per post plus a metadata index, and a single
/// score log. Writes are serialized through one lock per file family.
pub struct FileStorage {
    root: PathBuf,
    posts_lock: Mutex<()>,
    scores_lock: Mutex<()>,
}

impl FileStorage {
    pub async fn new_with_path(root: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(root.join(POSTS_DIR)).await?;
        tokio::fs::create_dir_all(root.join(SCORES_DIR)).await?;
        Ok(Self {
            root: root.to_path_buf(),
            posts_lock: Mutex::new(()),
            scores_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(POSTS_DIR).join(INDEX_FILE)
    }

    fn post_path(&self, slug: &str) -> PathBuf {
        self.root.join(POSTS_DIR).join(format!("{}.json", slug))
    }

    fn scores_path(&self) -> PathBuf {
        self.root.join(SCORES_DIR).join(SCORES_FILE)
    }

    async fn read_scores(&self) -> Result<Vec<QuizScore>> {
        Ok(read_json::<ScoresData>(&self.scores_path())
            .await?
            .unwrap_or_default()
            .scores)
    }
}

/// Slugs double as file names, so only `[A-Za-z0-9_-]` is accepted.
fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Writes through a temporary sibling and renames it into place.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, data).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl StorageBackend for FileStorage {
    fn get_error_message() -> &'static str {
        "Data directory should be writable"
    }

    async fn open(config: &StorageConfig) -> Result<Self> {
        Self::new_with_path(&config.data_dir).await
    }
}

#[async_trait]
impl PostStore for FileStorage {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        if !is_safe_slug(slug) {
            return Ok(None);
        }
        read_json(&self.post_path(slug)).await
    }

    async fn get_all(&self) -> Result<Vec<BlogPostMetadata>> {
        Ok(read_json(&self.index_path()).await?.unwrap_or_default())
    }

    async fn exists(&self, slug: &str) -> Result<bool> {
        if !is_safe_slug(slug) {
            return Ok(false);
        }
        Ok(tokio::fs::try_exists(self.post_path(slug)).await?)
    }

    async fn save(&self, post: &BlogPost) -> Result<BlogPost> {
        if !is_safe_slug(&post.slug) {
            return Err(Error::Validation(format!("Invalid slug: {:?}", post.slug)));
        }

        let _guard = self.posts_lock.lock().await;
        if self.exists(&post.slug).await? {
            return Err(Error::Conflict(format!("Blog post already exists: {}", post.slug)));
        }

        let mut index = self.get_all().await?;
        index.insert(0, post.metadata());

        let post_path = self.post_path(&post.slug);
        write_json(&post_path, post).await?;
        if let Err(e) = write_json(&self.index_path(), &index).await {
            if let Err(cleanup) = tokio::fs::remove_file(&post_path).await {
                tracing::warn!("Failed to remove {}: {}", post_path.display(), cleanup);
            }
            return Err(e);
        }

        tracing::info!("Blog post saved: {}", post.slug);
        Ok(post.clone())
    }
}

#[async_trait]
impl ScoreStore for FileStorage {
    async fn save_score(&self, score: i64, total: i64, name: Option<&str>) -> Result<QuizScore> {
        let entry = QuizScore::new(score, total, name)?;

        let _guard = self.scores_lock.lock().await;
        let mut scores = self.read_scores().await?;
        scores.push(entry.clone());
        if scores.len() > MAX_STORED_SCORES {
            let excess = scores.len() - MAX_STORED_SCORES;
            scores.drain(..excess);
        }
        write_json(&self.scores_path(), &ScoresData { scores }).await?;
        Ok(entry)
    }

    async fn all_time_leaderboard(&self, limit: usize) -> Result<Vec<QuizScore>> {
        Ok(rank_scores(self.read_scores().await?, limit))
    }

    async fn daily_leaderboard(&self, limit: usize) -> Result<Vec<QuizScore>> {
        let today = Utc::now().date_naive();
        let todays = self
            .read_scores()
            .await?
            .into_iter()
            .filter(|s| s.date == today)
            .collect();
        Ok(rank_scores(todays, limit))
    }

    async fn leaderboard_stats(&self) -> Result<LeaderboardStats> {
        let scores = self.read_scores().await?;
        Ok(LeaderboardStats::from_scores(&scores, Utc::now().date_naive()))
    }
}
