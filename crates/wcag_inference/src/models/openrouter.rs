use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use wcag_core::{Article, Error, FactCheckResult, FactChecker, PostGenerator, Result};

use super::{parse_fact_check, ChatMessage, ChatRequest, ChatResponse, ResponseFormat};
use crate::prompts;
use crate::Config;

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";

pub struct OpenRouterModel {
    client: Client,
    api_key: String,
    base_url: String,
    blog_model: String,
    fact_check_model: String,
    site_url: String,
}

impl fmt::Debug for OpenRouterModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("blog_model", &self.blog_model)
            .field("fact_check_model", &self.fact_check_model)
            .finish()
    }
}

impl OpenRouterModel {
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| Error::Config("OPENROUTER_API_KEY is not configured".to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key,
            base_url: config
                .base_url
                .unwrap_or_else(|| OPENROUTER_API_URL.to_string()),
            blog_model: config.blog_model,
            fact_check_model: config.fact_check_model,
            site_url: config.site_url,
        })
    }

    fn headers(&self, title: &'static str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Config(format!("Invalid API key header: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(referer) = HeaderValue::from_str(&self.site_url) {
            headers.insert("HTTP-Referer", referer);
        }
        headers.insert("X-Title", HeaderValue::from_static(title));
        Ok(headers)
    }

    /// Sends one chat completion and returns the first choice's text.
    /// Errors come back as plain messages so callers can wrap them in the
    /// stage-specific variant.
    async fn complete(
        &self,
        request: &ChatRequest,
        title: &'static str,
    ) -> std::result::Result<String, String> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %request.model, "OpenRouter chat request");

        let headers = self.headers(title).map_err(|e| e.to_string())?;
        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| format!("OpenRouter request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("OpenRouter API error: {} - {}", status, error_text));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| format!("Invalid OpenRouter response: {}", e))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| "No response from OpenRouter API".to_string())?;

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err("Empty response from OpenRouter API".to_string()),
        }
    }
}

#[async_trait]
impl PostGenerator for OpenRouterModel {
    fn name(&self) -> &str {
        "OpenRouter"
    }

    async fn generate_post(&self, articles: &[Article]) -> Result<String> {
        if articles.is_empty() {
            return Err(Error::Generation(
                "No articles provided for blog generation".to_string(),
            ));
        }

        let request = ChatRequest {
            model: self.blog_model.clone(),
            messages: vec![
                ChatMessage::system(prompts::WRITER_SYSTEM_PROMPT),
                ChatMessage::user(prompts::generation_prompt(articles)),
            ],
            temperature: 0.7,
            max_tokens: 4000,
            response_format: None,
        };

        let content = self
            .complete(&request, "TheWCAG Blog Generator")
            .await
            .map_err(Error::Generation)?;
        tracing::info!("Blog post generated ({} chars)", content.len());
        Ok(content)
    }
}

#[async_trait]
impl FactChecker for OpenRouterModel {
    fn name(&self) -> &str {
        "OpenRouter"
    }

    async fn fact_check(&self, content: &str, title: &str) -> Result<FactCheckResult> {
        let request = ChatRequest {
            model: self.fact_check_model.clone(),
            messages: vec![
                ChatMessage::system(prompts::FACT_CHECKER_SYSTEM_PROMPT),
                ChatMessage::user(prompts::fact_check_prompt(content, title)),
            ],
            temperature: 0.3,
            max_tokens: 1000,
            response_format: Some(ResponseFormat {
                kind: "json_object".to_string(),
            }),
        };

        let reply = self
            .complete(&request, "TheWCAG Fact Checker")
            .await
            .map_err(Error::FactCheck)?;
        let result = parse_fact_check(&reply)?;
        tracing::info!(
            "Fact-check completed: {}",
            if result.verified { "Verified" } else { "Needs Review" }
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use chrono::Utc;
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn model(base_url: String) -> OpenRouterModel {
        OpenRouterModel::new(Config {
            api_key: Some("sk-test".to_string()),
            base_url: Some(base_url),
            ..Config::default()
        })
        .unwrap()
    }

    fn article() -> Article {
        Article {
            title: "New ADA guidance".to_string(),
            url: "https://example.org/ada".to_string(),
            source: "Deque Blog".to_string(),
            published_date: Utc::now(),
            content: "The Department of Justice published accessibility guidance.".to_string(),
            excerpt: None,
        }
    }

    #[tokio::test]
    async fn test_generate_post_sends_blog_model() {
        let app = Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "openai/gpt-4o-mini");
                assert_eq!(body["max_tokens"], 4000);
                assert!(body.get("response_format").is_none());
                Json(json!({
                    "id": "gen-1",
                    "model": "openai/gpt-4o-mini",
                    "choices": [{"message": {"role": "assistant", "content": "## Intro\n\nText"}}]
                }))
            }),
        );
        let base_url = serve(app).await;

        let content = model(base_url).generate_post(&[article()]).await.unwrap();
        assert_eq!(content, "## Intro\n\nText");
    }

    #[tokio::test]
    async fn test_generate_post_rejects_empty_batch() {
        let err = model("http://127.0.0.1:9".to_string())
            .generate_post(&[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[tokio::test]
    async fn test_upstream_failure_maps_to_generation_error() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
        );
        let base_url = serve(app).await;

        let err = model(base_url).generate_post(&[article()]).await.unwrap_err();
        match err {
            Error::Generation(msg) => assert!(msg.contains("429")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fact_check_parses_json_reply() {
        let app = Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["response_format"]["type"], "json_object");
                Json(json!({
                    "choices": [{"message": {"content": "{\"verified\": false, \"notes\": \"Check the 2.2 date\"}"}}]
                }))
            }),
        );
        let base_url = serve(app).await;

        let result = model(base_url).fact_check("Body", "Title").await.unwrap();
        assert!(!result.verified);
        assert_eq!(result.notes, "Check the 2.2 date");
    }

    #[tokio::test]
    async fn test_fact_check_empty_choices_is_error() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { Json(json!({"choices": []})) }),
        );
        let base_url = serve(app).await;

        let err = model(base_url).fact_check("Body", "Title").await.unwrap_err();
        assert!(matches!(err, Error::FactCheck(_)));
    }
}
