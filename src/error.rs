use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Proxy error: {0}")]
    ProxyError(#[from] ProxyError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::ConfigError(format!("invalid url: {}", err))
    }
}

// Missing assets are reported as 404, every other I/O failure as 500
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(err.to_string()),
            _ => AppError::InternalError(err.to_string()),
        }
    }
}

// Implement actix_web::ResponseError for AppError
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = self.to_string();
        let response = json!({
            "error": {
                "status": status.as_u16(),
                "message": message
            }
        });
        HttpResponse::build(status).json(response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ProxyError(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failures of a single chat-completion call. The `Display` text is what the
/// user sees after `Error: ` in the reply frame.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API rate limited")]
    RateLimited,

    #[error("API response error ({status}): {body}")]
    ResponseError { status: u16, body: String },

    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    #[error("API returned no reply")]
    EmptyResponse,
}

impl ProxyError {
    /// Classify a non-success HTTP status from the completion API.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => ProxyError::InvalidApiKey,
            429 => ProxyError::RateLimited,
            _ => ProxyError::ResponseError { status, body },
        }
    }
}
