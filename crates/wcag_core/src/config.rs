use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_SITE_URL: &str = "https://thewcag.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("production") => Environment::Production,
            Some("test") => Environment::Test,
            _ => Environment::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvVarCheck {
    pub key: &'static str,
    pub set: bool,
    pub required: bool,
}

impl EnvVarCheck {
    fn required(key: &'static str, set: bool) -> Self {
        Self {
            key,
            set,
            required: true,
        }
    }

    fn optional(key: &'static str, set: bool) -> Self {
        Self {
            key,
            set,
            required: false,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.required && !self.set
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct AppConfig {
    // OpenRouter
    pub openrouter_api_key: Option<String>,
    pub blog_model: String,
    pub fact_check_model: String,
    /// Whether each model above came from the environment rather than
    /// `DEFAULT_MODEL`.
    models_from_env: (bool, bool),
    pub site_url: String,

    // Secrets guarding the cron and revalidation routes
    pub cron_secret: Option<String>,
    pub revalidate_secret: Option<String>,

    // Sources
    pub rss_feeds: Option<Vec<String>>,
    pub news_api_key: Option<String>,

    pub environment: Environment,
    pub auto_publish: bool,
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let blog_model = get("OPENROUTER_BLOG_MODEL");
        let fact_check_model = get("OPENROUTER_FACT_CHECK_MODEL");

        Self {
            openrouter_api_key: get("OPENROUTER_API_KEY"),
            models_from_env: (blog_model.is_some(), fact_check_model.is_some()),
            blog_model: blog_model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            fact_check_model: fact_check_model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            site_url: get("SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
            cron_secret: get("CRON_SECRET"),
            revalidate_secret: get("REVALIDATE_SECRET"),
            rss_feeds: get("RSS_FEEDS").map(|feeds| {
                feeds
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
            news_api_key: get("NEWS_API_KEY"),
            environment: Environment::parse(get("NODE_ENV").as_deref()),
            auto_publish: get("BLOG_AUTO_PUBLISH").as_deref() == Some("true"),
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
        }
    }

    /// Variables the blog pipeline reads, in reporting order. The model
    /// variables fall back to `DEFAULT_MODEL`, so they are never required.
    pub fn pipeline_env_check(&self) -> Vec<EnvVarCheck> {
        let (blog_model, fact_check_model) = self.models_from_env;
        vec![
            EnvVarCheck::required("OPENROUTER_API_KEY", self.openrouter_api_key.is_some()),
            EnvVarCheck::optional("OPENROUTER_BLOG_MODEL", blog_model),
            EnvVarCheck::optional("OPENROUTER_FACT_CHECK_MODEL", fact_check_model),
            EnvVarCheck::required("CRON_SECRET", self.cron_secret.is_some()),
            EnvVarCheck::required("REVALIDATE_SECRET", self.revalidate_secret.is_some()),
        ]
    }

    pub fn log_keys(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) => {
                    let n = v.chars().count().min(4);
                    let head: String = v.chars().take(n).collect();
                    format!("{}...({} chars)", head, v.len())
                }
                None => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded ({}):", self.environment);
        tracing::info!("  OPENROUTER_API_KEY: {}", preview_opt(&self.openrouter_api_key));
        tracing::info!("  OPENROUTER_BLOG_MODEL: {}", self.blog_model);
        tracing::info!("  OPENROUTER_FACT_CHECK_MODEL: {}", self.fact_check_model);
        tracing::info!("  CRON_SECRET: {}", preview_opt(&self.cron_secret));
        tracing::info!("  REVALIDATE_SECRET: {}", preview_opt(&self.revalidate_secret));
        tracing::info!("  NEWS_API_KEY: {}", preview_opt(&self.news_api_key));
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("AppConfig")
            .field("openrouter_api_key", &redact(&self.openrouter_api_key))
            .field("blog_model", &self.blog_model)
            .field("fact_check_model", &self.fact_check_model)
            .field("site_url", &self.site_url)
            .field("cron_secret", &redact(&self.cron_secret))
            .field("revalidate_secret", &redact(&self.revalidate_secret))
            .field("rss_feeds", &self.rss_feeds)
            .field("news_api_key", &redact(&self.news_api_key))
            .field("environment", &self.environment)
            .field("auto_publish", &self.auto_publish)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}
