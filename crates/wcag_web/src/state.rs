use std::sync::Arc;
use wcag_core::{AppConfig, PostStore, ScoreStore};
use wcag_scrapers::BlogPipeline;

use crate::cache::PageCache;

pub struct AppState {
    pub config: Arc<AppConfig>,
    pub posts: Arc<dyn PostStore>,
    pub scores: Arc<dyn ScoreStore>,
    pub pipeline: Arc<BlogPipeline>,
    pub cache: Arc<PageCache>,
}
