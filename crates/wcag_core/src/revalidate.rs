use async_trait::async_trait;
use crate::Result;

/// Invalidates cached renderings of a site path such as `/blog`.
#[async_trait]
pub trait Revalidator: Send + Sync {
    async fn revalidate(&self, path: &str) -> Result<()>;
}
