pub mod config;
pub mod error;
pub mod models;
pub mod revalidate;
pub mod storage;
pub mod types;

pub use config::{AppConfig, EnvVarCheck, Environment};
pub use error::{Error, Result};
pub use models::{FactChecker, PostGenerator};
pub use revalidate::Revalidator;
pub use storage::{PostStore, ScoreStore};
pub use types::{
    Article, BlogPost, BlogPostMetadata, FactCheckResult, FactCheckStatus, LeaderboardStats,
    QuizScore, SourceRef,
};
