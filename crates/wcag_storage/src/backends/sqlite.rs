use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use wcag_core::storage::MAX_STORED_SCORES;
use wcag_core::{
    BlogPost, BlogPostMetadata, Error, FactCheckStatus, LeaderboardStats, PostStore, QuizScore,
    Result, ScoreStore,
};

use crate::{StorageBackend, StorageConfig};

const DB_FILE: &str = "wcag.db";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS blog_posts (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        slug TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        excerpt TEXT NOT NULL,
        published_at TEXT NOT NULL,
        generated_at TEXT NOT NULL,
        sources TEXT NOT NULL,
        fact_check_status TEXT NOT NULL,
        fact_check_notes TEXT,
        is_published INTEGER NOT NULL,
        tags TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS quiz_scores (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL,
        name TEXT,
        score INTEGER NOT NULL,
        total INTEGER NOT NULL,
        percentage INTEGER NOT NULL,
        timestamp TEXT NOT NULL,
        date TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_quiz_scores_date ON quiz_scores (date)",
];

fn db_err(context: &str, e: sqlx::Error) -> Error {
    Error::Storage(format!("{}: {}", context, e))
}

fn parse_time(value: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("Failed to parse date {:?}: {}", value, e)))
}

async fn insert_score(conn: &mut SqliteConnection, entry: &QuizScore) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO quiz_scores (id, name, score, total, percentage, timestamp, date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.id)
    .bind(entry.name.as_deref())
    .bind(entry.score as i64)
    .bind(entry.total as i64)
    .bind(entry.percentage as i64)
    .bind(entry.timestamp.to_rfc3339())
    .bind(entry.date.to_string())
    .execute(conn)
    .await
    .map_err(|e| db_err("Failed to store score", e))?;
    Ok(())
}

pub struct SqliteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| db_err("Failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| db_err(&format!("Failed to run migration {}", i), e))?;
        }

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    fn row_to_post(row: &SqliteRow) -> Result<BlogPost> {
        Ok(BlogPost {
            slug: row.get("slug"),
            title: row.get("title"),
            content: row.get("content"),
            excerpt: row.get("excerpt"),
            published_at: parse_time(row.get("published_at"))?,
            generated_at: parse_time(row.get("generated_at"))?,
            sources: serde_json::from_str(row.get::<&str, _>("sources"))?,
            fact_check_status: FactCheckStatus::from_str(row.get("fact_check_status"))?,
            fact_check_notes: row.get("fact_check_notes"),
            is_published: row.get("is_published"),
            tags: serde_json::from_str(row.get::<&str, _>("tags"))?,
        })
    }

    fn row_to_metadata(row: &SqliteRow) -> Result<BlogPostMetadata> {
        Ok(BlogPostMetadata {
            slug: row.get("slug"),
            title: row.get("title"),
            excerpt: row.get("excerpt"),
            published_at: parse_time(row.get("published_at"))?,
            fact_check_status: FactCheckStatus::from_str(row.get("fact_check_status"))?,
            is_published: row.get("is_published"),
        })
    }

    fn row_to_score(row: &SqliteRow) -> Result<QuizScore> {
        let date: String = row.get("date");
        Ok(QuizScore {
            id: row.get("id"),
            name: row.get("name"),
            score: row.get::<i64, _>("score") as u32,
            total: row.get::<i64, _>("total") as u32,
            percentage: row.get::<i64, _>("percentage") as u32,
            timestamp: parse_time(row.get("timestamp"))?,
            date: NaiveDate::from_str(&date)
                .map_err(|e| Error::Storage(format!("Failed to parse date {:?}: {}", date, e)))?,
        })
    }

    /// Inserts a validated score and trims the table to the newest
    /// `MAX_STORED_SCORES` rows in one transaction.
    async fn record_score(&self, entry: QuizScore) -> Result<QuizScore> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("Failed to begin transaction", e))?;

        insert_score(&mut *tx, &entry).await?;

        sqlx::query(
            "DELETE FROM quiz_scores WHERE seq NOT IN (SELECT seq FROM quiz_scores ORDER BY seq DESC LIMIT ?)",
        )
        .bind(MAX_STORED_SCORES as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("Failed to trim scores", e))?;

        tx.commit()
            .await
            .map_err(|e| db_err("Failed to commit score", e))?;
        Ok(entry)
    }

    async fn ranked(&self, date: Option<NaiveDate>, limit: usize) -> Result<Vec<QuizScore>> {
        let rows = match date {
            Some(date) => {
                sqlx::query(
                    "SELECT * FROM quiz_scores WHERE date = ? ORDER BY percentage DESC, seq ASC LIMIT ?",
                )
                .bind(date.to_string())
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT * FROM quiz_scores ORDER BY percentage DESC, seq ASC LIMIT ?")
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| db_err("Failed to read leaderboard", e))?;

        rows.iter().map(Self::row_to_score).collect()
    }
}

#[async_trait]
impl StorageBackend for SqliteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be available at <data-dir>/wcag.db"
    }

    async fn open(config: &StorageConfig) -> Result<Self> {
        Self::new_with_path(&config.data_dir.join(DB_FILE)).await
    }
}

#[async_trait]
impl PostStore for SqliteStorage {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let row = sqlx::query("SELECT * FROM blog_posts WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("Failed to read blog post", e))?;
        row.as_ref().map(Self::row_to_post).transpose()
    }

    async fn get_all(&self) -> Result<Vec<BlogPostMetadata>> {
        let rows = sqlx::query(
            "SELECT slug, title, excerpt, published_at, fact_check_status, is_published FROM blog_posts ORDER BY seq DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to list blog posts", e))?;
        rows.iter().map(Self::row_to_metadata).collect()
    }

    async fn exists(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM blog_posts WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("Failed to check blog post", e))?;
        Ok(row.is_some())
    }

    async fn save(&self, post: &BlogPost) -> Result<BlogPost> {
        let result = sqlx::query(
            r#"
            INSERT INTO blog_posts
            (slug, title, content, excerpt, published_at, generated_at, sources,
             fact_check_status, fact_check_notes, is_published, tags)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(post.published_at.to_rfc3339())
        .bind(post.generated_at.to_rfc3339())
        .bind(serde_json::to_string(&post.sources)?)
        .bind(post.fact_check_status.as_str())
        .bind(post.fact_check_notes.as_deref())
        .bind(post.is_published)
        .bind(serde_json::to_string(&post.tags)?)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(post.clone()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(Error::Conflict(
                format!("Blog post already exists: {}", post.slug),
            )),
            Err(e) => Err(db_err("Failed to store blog post", e)),
        }
    }
}

#[async_trait]
impl ScoreStore for SqliteStorage {
    async fn save_score(&self, score: i64, total: i64, name: Option<&str>) -> Result<QuizScore> {
        self.record_score(QuizScore::new(score, total, name)?).await
    }

    async fn all_time_leaderboard(&self, limit: usize) -> Result<Vec<QuizScore>> {
        self.ranked(None, limit).await
    }

    async fn daily_leaderboard(&self, limit: usize) -> Result<Vec<QuizScore>> {
        self.ranked(Some(Utc::now().date_naive()), limit).await
    }

    async fn leaderboard_stats(&self) -> Result<LeaderboardStats> {
        let today = Utc::now().date_naive().to_string();
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total_attempts,
                   COALESCE(SUM(CASE WHEN date = ? THEN 1 ELSE 0 END), 0) AS today_attempts,
                   AVG(percentage) AS average
            FROM quiz_scores
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("Failed to compute stats", e))?;

        Ok(LeaderboardStats {
            total_attempts: row.get::<i64, _>("total_attempts") as usize,
            today_attempts: row.get::<i64, _>("today_attempts") as usize,
            average_score: row
                .get::<Option<f64>, _>("average")
                .map(|avg| avg.round() as u32)
                .unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dated_score, sample_post};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sqlite_posts() {
        let temp_dir = tempdir().unwrap();
        let storage = SqliteStorage::new_with_path(&temp_dir.path().join("test.db"))
            .await
            .unwrap();

        let post = sample_post("a11y-roundup", false);
        storage.save(&post).await.unwrap();
        assert!(storage.exists("a11y-roundup").await.unwrap());
        assert_eq!(storage.get_by_slug("a11y-roundup").await.unwrap().unwrap().slug, post.slug);
        assert!(storage.get_published().await.unwrap().is_empty());
        assert!(matches!(storage.save(&post).await, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_sqlite_leaderboard() {
        let temp_dir = tempdir().unwrap();
        let storage = SqliteStorage::new_with_path(&temp_dir.path().join("test.db"))
            .await
            .unwrap();

        storage.save_score(3, 10, None).await.unwrap();
        storage.save_score(9, 10, None).await.unwrap();
        storage.save_score(7, 10, None).await.unwrap();
        assert!(storage.save_score(11, 10, None).await.is_err());

        let top = storage.all_time_leaderboard(2).await.unwrap();
        assert_eq!(top.iter().map(|s| s.score).collect::<Vec<_>>(), vec![9, 7]);

        let stats = storage.leaderboard_stats().await.unwrap();
        assert_eq!(stats.total_attempts, 3);
        assert_eq!(stats.today_attempts, 3);
        assert_eq!(stats.average_score, 63);
    }

    #[tokio::test]
    async fn test_sqlite_daily_window_and_retention() {
        let temp_dir = tempdir().unwrap();
        let storage = SqliteStorage::new_with_path(&temp_dir.path().join("test.db"))
            .await
            .unwrap();

        let mut tx = storage.pool.begin().await.unwrap();
        insert_score(&mut *tx, &dated_score(10, 10, "oldest", 2)).await.unwrap();
        insert_score(&mut *tx, &dated_score(9, 10, "yesterday", 1)).await.unwrap();
        for i in 2..MAX_STORED_SCORES {
            let entry = dated_score(5, 10, &format!("old{}", i), 2);
            insert_score(&mut *tx, &entry).await.unwrap();
        }
        tx.commit().await.unwrap();

        storage.save_score(7, 10, Some("today")).await.unwrap();

        let stats = storage.leaderboard_stats().await.unwrap();
        assert_eq!(stats.total_attempts, MAX_STORED_SCORES);
        assert_eq!(stats.today_attempts, 1);

        let top = storage.all_time_leaderboard(1).await.unwrap();
        assert_eq!(top[0].name.as_deref(), Some("yesterday"));

        let daily = storage.daily_leaderboard(10).await.unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].name.as_deref(), Some("today"));
        assert_eq!(daily[0].percentage, 70);
    }
}
