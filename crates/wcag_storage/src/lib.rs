use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use wcag_core::{Error, PostStore, Result, ScoreStore};

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: PostStore + ScoreStore + Sized + 'static {
    fn get_error_message() -> &'static str;
    async fn open(config: &StorageConfig) -> Result<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    File,
    Sqlite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "file" | "json" => Ok(StorageKind::File),
            "sqlite" => Ok(StorageKind::Sqlite),
            other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageKind::Memory => "memory",
            StorageKind::File => "file",
            StorageKind::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub kind: StorageKind,
    pub data_dir: PathBuf,
}

/// Both stores, usually backed by the same backend instance.
#[derive(Clone)]
pub struct Storage {
    pub posts: Arc<dyn PostStore>,
    pub scores: Arc<dyn ScoreStore>,
}

impl Storage {
    pub fn from_backend<T: StorageBackend>(backend: T) -> Self {
        let backend = Arc::new(backend);
        Self {
            posts: backend.clone(),
            scores: backend,
        }
    }
}

async fn open_backend<T: StorageBackend>(config: &StorageConfig) -> Result<Storage> {
    let backend = T::open(config).await.map_err(|e| {
        Error::Storage(format!("{} ({})", T::get_error_message(), e))
    })?;
    tracing::info!("Storage backend ready: {}", config.kind);
    Ok(Storage::from_backend(backend))
}

pub async fn create_storage(config: &StorageConfig) -> Result<Storage> {
    match config.kind {
        StorageKind::Memory => open_backend::<InMemoryStorage>(config).await,
        StorageKind::File => open_backend::<FileStorage>(config).await,
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => open_backend::<SqliteStorage>(config).await,
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => Err(Error::Config(
            "SQLite support not compiled in (enable the `sqlite` feature)".to_string(),
        )),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_storage_kind_parsing() {
        assert_eq!("memory".parse::<StorageKind>().unwrap(), StorageKind::Memory);
        assert_eq!("FILE".parse::<StorageKind>().unwrap(), StorageKind::File);
        assert_eq!("sqlite".parse::<StorageKind>().unwrap(), StorageKind::Sqlite);
        assert!("qdrant".parse::<StorageKind>().is_err());
    }

    #[tokio::test]
    async fn test_create_storage_shares_backend() {
        let temp_dir = tempdir().unwrap();
        let config = StorageConfig {
            kind: StorageKind::File,
            data_dir: temp_dir.path().to_path_buf(),
        };
        let storage = create_storage(&config).await.unwrap();
        storage.scores.save_score(5, 10, Some("Ada")).await.unwrap();
        assert_eq!(storage.scores.leaderboard_stats().await.unwrap().total_attempts, 1);
        assert!(storage.posts.get_all().await.unwrap().is_empty());
    }
}
