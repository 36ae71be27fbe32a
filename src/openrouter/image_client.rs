use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::{
    config::OpenRouterConfig,
    error::{RelayError, Result},
    logger,
    models::{ImageGenerationRequest, ImageGenerationResponse},
    openrouter::{
        transport::{HttpUpstream, ImageUpstream},
        types::{extract_image_url, ChatCompletionRequest},
    },
};

/// Relays a prompt to an image-capable chat model and normalizes the reply.
#[derive(Clone)]
pub struct ImageClient {
    upstream: Arc<dyn ImageUpstream>,
    api_key: Option<String>,
    default_model: String,
}

impl ImageClient {
    pub fn new(config: &OpenRouterConfig) -> Result<Self> {
        let upstream = HttpUpstream::new(config)?;
        Ok(Self::with_upstream(config, Arc::new(upstream)))
    }

    pub fn with_upstream(config: &OpenRouterConfig, upstream: Arc<dyn ImageUpstream>) -> Self {
        Self {
            upstream,
            api_key: config.api_key.clone(),
            default_model: config.default_model.clone(),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub async fn generate(&self, request: ImageGenerationRequest) -> Result<ImageGenerationResponse> {
        let request_id = Uuid::new_v4();
        let model = request.model_or(&self.default_model);

        log::info!(
            "📩 [req:{}] Prompt: {:?} Model: {}",
            request_id,
            request.prompt,
            model
        );

        let api_key = match self.api_key.as_deref() {
            Some(key) => key,
            None => {
                log::error!("[req:{}] Missing OPENROUTER_API_KEY", request_id);
                return Err(RelayError::MissingApiKey);
            }
        };

        if request.prompt.is_empty() {
            log::warn!("[req:{}] Rejected request with empty prompt", request_id);
            return Err(RelayError::InvalidRequest("Prompt is required".into()));
        }

        let payload = ChatCompletionRequest::image_prompt(model, request.prompt.as_str());

        let mut timer = logger::timer("OpenRouter chat completion");
        let reply = self.upstream.send(api_key, &payload).await;
        timer.stop();

        let reply = reply.map_err(|e| {
            log::error!("[req:{}] Upstream call failed: {}", request_id, e);
            e
        })?;

        let data: Value = match serde_json::from_str(&reply.body) {
            Ok(data) => data,
            Err(_) => {
                log::error!(
                    "[req:{}] Non-JSON response ({}): {}",
                    request_id,
                    reply.status,
                    reply.body
                );
                return Err(RelayError::NonJsonResponse { raw: reply.body });
            }
        };

        if !reply.is_success() {
            log::error!(
                "[req:{}] OpenRouter error ({}): {}",
                request_id,
                reply.status,
                data
            );
            return Err(RelayError::UpstreamRejected {
                status: reply.status,
                info: data,
            });
        }

        let image = extract_image_url(&data).map_err(|e| {
            log::error!("[req:{}] Model did not return an image: {}", request_id, data);
            e
        })?;

        log::info!("🎨 [req:{}] Image generated with {}", request_id, model);

        Ok(ImageGenerationResponse { image })
    }
}
