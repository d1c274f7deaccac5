use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Busy: {0}")]
    Busy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Fact-check error: {0}")]
    FactCheck(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// True for failures caused by a remote service rather than the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Fetch(_) | Error::Generation(_) | Error::FactCheck(_) | Error::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_classification() {
        assert!(Error::Generation("timeout".into()).is_upstream());
        assert!(Error::FactCheck("bad json".into()).is_upstream());
        assert!(!Error::Validation("score".into()).is_upstream());
        assert!(!Error::Storage("disk".into()).is_upstream());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::Validation("Score must be between 0 and total".into());
        assert_eq!(err.to_string(), "Validation error: Score must be between 0 and total");
    }
}
