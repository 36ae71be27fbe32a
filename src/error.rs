use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing OPENROUTER_API_KEY")]
    MissingApiKey,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Upstream timed out: {0}")]
    Timeout(String),

    #[error("Non-JSON response from OpenRouter")]
    NonJsonResponse { raw: String },

    #[error("OpenRouter request failed with status {status}")]
    UpstreamRejected { status: u16, info: Value },

    #[error("Model did not return an image")]
    MissingImage { raw: Value },
}

pub type Result<T> = std::result::Result<T, RelayError>;

/// JSON body returned to the caller on every failure path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            info: None,
            raw: None,
            details: None,
        }
    }

    pub fn with_info(mut self, info: Value) -> Self {
        self.info = Some(info);
        self
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl RelayError {
    pub fn body(&self) -> ErrorBody {
        match self {
            RelayError::ConfigError(msg) => {
                ErrorBody::new("Server misconfigured").with_details(msg.clone())
            }
            RelayError::MissingApiKey => ErrorBody::new("Missing OPENROUTER_API_KEY"),
            RelayError::InvalidRequest(msg) => ErrorBody::new(msg.clone()),
            RelayError::InvalidBody(msg) => {
                ErrorBody::new("Invalid request body").with_details(msg.clone())
            }
            RelayError::TransportError(msg) => {
                ErrorBody::new("Server error").with_details(msg.clone())
            }
            RelayError::Timeout(msg) => {
                ErrorBody::new("OpenRouter request timed out").with_details(msg.clone())
            }
            RelayError::NonJsonResponse { raw } => {
                ErrorBody::new("Non-JSON response from OpenRouter")
                    .with_raw(Value::String(raw.clone()))
            }
            RelayError::UpstreamRejected { info, .. } => {
                ErrorBody::new("OpenRouter request failed").with_info(info.clone())
            }
            RelayError::MissingImage { raw } => {
                ErrorBody::new("Model did not return an image").with_raw(raw.clone())
            }
        }
    }
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidRequest(_) | RelayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            RelayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            // Upstream status codes are forwarded verbatim.
            RelayError::UpstreamRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::ConfigError(_)
            | RelayError::MissingApiKey
            | RelayError::TransportError(_)
            | RelayError::NonJsonResponse { .. }
            | RelayError::MissingImage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.body())
    }
}
