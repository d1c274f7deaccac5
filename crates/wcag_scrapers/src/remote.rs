use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use wcag_core::{Error, Result, Revalidator};

/// Revalidates paths on a running site through its `/api/revalidate`
/// endpoint. Used when the pipeline runs outside the web process.
pub struct HttpRevalidator {
    client: Client,
    endpoint: String,
    secret: Option<String>,
}

impl HttpRevalidator {
    pub fn new(site_url: &str, secret: Option<String>) -> Result<Self> {
        let base = url::Url::parse(site_url)
            .map_err(|e| Error::Config(format!("Invalid site URL {}: {}", site_url, e)))?;
        let endpoint = base
            .join("/api/revalidate")
            .map_err(|e| Error::Config(format!("Invalid site URL {}: {}", site_url, e)))?;
        Ok(Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            secret,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Revalidator for HttpRevalidator {
    async fn revalidate(&self, path: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "path": path, "secret": self.secret }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Fetch(format!(
                "Revalidation of {} failed: HTTP {}",
                path,
                response.status()
            )));
        }
        tracing::debug!("Revalidated {}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_support::serve;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_endpoint_from_site_url() {
        let revalidator = HttpRevalidator::new("https://thewcag.com/blog", None).unwrap();
        assert_eq!(revalidator.endpoint(), "https://thewcag.com/api/revalidate");
        assert!(matches!(
            HttpRevalidator::new("not a url", None),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_posts_path_and_secret() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorded = seen.clone();
        let base = serve(move |_| {
            Router::new().route(
                "/api/revalidate",
                post(move |Json(body): Json<Value>| async move {
                    if body["secret"] != "s3cret" {
                        return StatusCode::UNAUTHORIZED;
                    }
                    recorded
                        .lock()
                        .unwrap()
                        .push(body["path"].as_str().unwrap_or_default().to_string());
                    StatusCode::OK
                }),
            )
        })
        .await;

        let ok = HttpRevalidator::new(&base, Some("s3cret".to_string())).unwrap();
        ok.revalidate("/blog").await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["/blog"]);

        let wrong = HttpRevalidator::new(&base, Some("nope".to_string())).unwrap();
        let err = wrong.revalidate("/blog").await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }
}
