use wcag_core::config::{AppConfig, DEFAULT_MODEL, DEFAULT_SITE_URL};

pub mod models;
pub mod prompts;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub blog_model: String,
    pub fact_check_model: String,
    pub base_url: Option<String>,
    pub site_url: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: None,
            blog_model: DEFAULT_MODEL.to_string(),
            fact_check_model: DEFAULT_MODEL.to_string(),
            base_url: None,
            site_url: DEFAULT_SITE_URL.to_string(),
            timeout_secs: 120,
        }
    }
}

impl Config {
    pub fn from_app_config(app: &AppConfig, model_name: Option<String>) -> Self {
        Self {
            api_key: app.openrouter_api_key.clone(),
            model_name,
            blog_model: app.blog_model.clone(),
            fact_check_model: app.fact_check_model.clone(),
            site_url: app.site_url.clone(),
            ..Self::default()
        }
    }
}

pub mod prelude {
    pub use super::Config;
    pub use super::models::{create_model, Models};
    pub use wcag_core::{Article, Error, FactCheckResult, Result};
}

pub use models::{create_model, Models};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_app_config() {
        let app = AppConfig::from_lookup(|key| match key {
            "OPENROUTER_API_KEY" => Some("sk-live".to_string()),
            "OPENROUTER_FACT_CHECK_MODEL" => Some("openai/gpt-4o".to_string()),
            _ => None,
        });
        let config = Config::from_app_config(&app, Some("openrouter".to_string()));
        assert_eq!(config.api_key.as_deref(), Some("sk-live"));
        assert_eq!(config.blog_model, DEFAULT_MODEL);
        assert_eq!(config.fact_check_model, "openai/gpt-4o");
        assert!(config.base_url.is_none());
    }
}
