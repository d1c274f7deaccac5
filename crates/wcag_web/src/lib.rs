use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use wcag_core::Result;

pub mod cache;
pub mod error;
pub mod handlers;
pub mod state;

pub use cache::PageCache;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/quiz/scores",
            get(handlers::get_scores).post(handlers::post_score),
        )
        .route("/api/revalidate", post(handlers::revalidate))
        .route("/api/cron/generate-blog", get(handlers::cron_generate_blog))
        .route("/api/test-blog", get(handlers::test_blog))
        .route("/api/blog", get(handlers::list_posts))
        .route("/api/blog/:slug", get(handlers::get_post))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState, PageCache};
    pub use wcag_core::{Error, Result};
}
