use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wcag_core::{Error, FactCheckResult, FactChecker, PostGenerator, Result};

use crate::Config;

pub mod dummy;
pub mod openrouter;

pub use dummy::DummyModel;
pub use openrouter::OpenRouterModel;

lazy_static! {
    static ref FENCED_JSON: Regex = Regex::new(r"```(?:json)?\s*(\{[\s\S]*\})\s*```").unwrap();
    static ref BARE_JSON: Regex = Regex::new(r"\{[\s\S]*\}").unwrap();
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: String) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFactCheck {
    verified: serde_json::Value,
    notes: serde_json::Value,
}

/// Parses a fact-check reply. Accepts bare JSON, JSON inside a fenced code
/// block, or the outermost `{...}` span of a chattier reply.
pub fn parse_fact_check(content: &str) -> Result<FactCheckResult> {
    let raw: RawFactCheck = match serde_json::from_str(content.trim()) {
        Ok(raw) => raw,
        Err(_) => {
            let candidate = FENCED_JSON
                .captures(content)
                .and_then(|c| c.get(1))
                .or_else(|| BARE_JSON.find(content))
                .map(|m| m.as_str())
                .ok_or_else(|| {
                    Error::FactCheck("Failed to parse fact-check response as JSON".to_string())
                })?;
            serde_json::from_str(candidate).map_err(|e| {
                Error::FactCheck(format!("Failed to parse fact-check response as JSON: {}", e))
            })?
        }
    };

    match (raw.verified, raw.notes) {
        (serde_json::Value::Bool(verified), serde_json::Value::String(notes)) => {
            Ok(FactCheckResult { verified, notes })
        }
        _ => Err(Error::FactCheck("Invalid fact-check result format".to_string())),
    }
}

/// A generator and a fact checker, usually the same model.
#[derive(Clone)]
pub struct Models {
    pub generator: Arc<dyn PostGenerator>,
    pub fact_checker: Arc<dyn FactChecker>,
}

impl Models {
    fn from_model<T: PostGenerator + FactChecker + 'static>(model: T) -> Self {
        let model = Arc::new(model);
        Self {
            generator: model.clone(),
            fact_checker: model,
        }
    }
}

/// Builds the models named by `config.model_name`: `openrouter` (default)
/// or `dummy`.
pub fn create_model(config: Config) -> Result<Models> {
    let name = config
        .model_name
        .clone()
        .unwrap_or_else(|| "openrouter".to_string());
    let models = match name.to_lowercase().as_str() {
        "openrouter" => Models::from_model(OpenRouterModel::new(config)?),
        "dummy" => Models::from_model(DummyModel::new()),
        other => return Err(Error::Config(format!("Unknown model: {}", other))),
    };
    tracing::info!("Inference model initialized: {}", models.generator.name());
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let result = parse_fact_check(r#"{"verified": true, "notes": "All facts verified"}"#).unwrap();
        assert!(result.verified);
        assert_eq!(result.notes, "All facts verified");
    }

    #[test]
    fn test_parse_fenced_json() {
        let reply = "Here you go:\n```json\n{\"verified\": false, \"notes\": \"WCAG 2.2 date is wrong\"}\n```";
        let result = parse_fact_check(reply).unwrap();
        assert!(!result.verified);
        assert_eq!(result.notes, "WCAG 2.2 date is wrong");
    }

    #[test]
    fn test_parse_embedded_json() {
        let reply = "Result: {\"verified\": true, \"notes\": \"ok\"} thanks";
        assert!(parse_fact_check(reply).unwrap().verified);
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        let err = parse_fact_check(r#"{"verified": "yes", "notes": "ok"}"#).unwrap_err();
        assert!(matches!(err, Error::FactCheck(_)));
        assert!(parse_fact_check("no json here").is_err());
        assert!(parse_fact_check(r#"{"verified": true}"#).is_err());
    }

    #[test]
    fn test_create_model_by_name() {
        let config = Config {
            model_name: Some("dummy".to_string()),
            ..Config::default()
        };
        let models = create_model(config).unwrap();
        assert_eq!(models.generator.name(), "Dummy");
        assert_eq!(models.fact_checker.name(), "Dummy");

        let unknown = Config {
            model_name: Some("ollama".to_string()),
            ..Config::default()
        };
        assert!(matches!(create_model(unknown), Err(Error::Config(_))));
    }

    #[test]
    fn test_openrouter_requires_api_key() {
        assert!(matches!(create_model(Config::default()), Err(Error::Config(_))));
    }
}
