use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::OpenRouterConfig,
    error::{RelayError, Result},
    openrouter::types::ChatCompletionRequest,
};

/// Status and raw body of an upstream reply, before any JSON parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

impl UpstreamReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait ImageUpstream: Send + Sync {
    async fn send(&self, api_key: &str, request: &ChatCompletionRequest) -> Result<UpstreamReply>;
}

pub struct HttpUpstream {
    client: Client,
    endpoint: String,
}

impl HttpUpstream {
    pub fn new(config: &OpenRouterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RelayError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.completions_url(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_headers(api_key: &str) -> Result<reqwest::header::HeaderMap> {
        let mut headers = reqwest::header::HeaderMap::new();
        let bearer: reqwest::header::HeaderValue = format!("Bearer {}", api_key)
            .parse()
            .map_err(|_| RelayError::ConfigError("API key is not a valid header value".into()))?;
        headers.insert(reqwest::header::AUTHORIZATION, bearer);
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }
}

#[async_trait]
impl ImageUpstream for HttpUpstream {
    async fn send(&self, api_key: &str, request: &ChatCompletionRequest) -> Result<UpstreamReply> {
        let response = self
            .client
            .post(&self.endpoint)
            .headers(Self::build_headers(api_key)?)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::Timeout(e.to_string())
                } else {
                    RelayError::TransportError(format!("OpenRouter request failed: {}", e))
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                RelayError::Timeout(e.to_string())
            } else {
                RelayError::TransportError(format!("Failed to read OpenRouter response: {}", e))
            }
        })?;

        Ok(UpstreamReply { status, body })
    }
}
