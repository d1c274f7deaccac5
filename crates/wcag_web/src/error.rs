use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use wcag_core::{Environment, Error};

/// A failed request. Caller errors carry their own message; everything else
/// is reported under `context`, with the underlying error attached as
/// `message` in development.
#[derive(Debug, thiserror::Error)]
#[error("{context}: {source}")]
pub struct ApiError {
    source: Error,
    context: &'static str,
    expose_details: bool,
}

impl ApiError {
    pub fn new(source: Error, context: &'static str) -> Self {
        Self {
            source,
            context,
            expose_details: false,
        }
    }

    pub fn validation(message: &str) -> Self {
        Self::new(Error::Validation(message.to_string()), "Invalid request")
    }

    pub fn with_details(mut self, environment: Environment) -> Self {
        self.expose_details = environment == Environment::Development;
        self
    }

    pub fn status(&self) -> StatusCode {
        match self.source {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) | Error::Busy(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> Option<&str> {
        match &self.source {
            Error::Validation(m)
            | Error::Unauthorized(m)
            | Error::Forbidden(m)
            | Error::NotFound(m)
            | Error::Conflict(m)
            | Error::Busy(m) => Some(m),
            _ => None,
        }
    }
}

impl From<Error> for ApiError {
    fn from(source: Error) -> Self {
        Self::new(source, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.client_message() {
            Some(message) => json!({ "success": false, "error": message }),
            None => {
                tracing::error!("{}: {}", self.context, self.source);
                if self.expose_details {
                    json!({
                        "success": false,
                        "error": self.context,
                        "message": self.source.to_string(),
                    })
                } else {
                    json!({ "success": false, "error": self.context })
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::Validation("x".into()), StatusCode::BAD_REQUEST),
            (Error::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (Error::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (Error::Conflict("x".into()), StatusCode::CONFLICT),
            (Error::Busy("x".into()), StatusCode::CONFLICT),
            (Error::Generation("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn test_details_only_in_development() {
        let err = ApiError::new(Error::Generation("503".into()), "Blog generation failed");
        assert!(!err.expose_details);
        assert!(err.with_details(Environment::Development).expose_details);

        let err = ApiError::new(Error::Generation("503".into()), "Blog generation failed")
            .with_details(Environment::Production);
        assert!(!err.expose_details);
    }
}
