pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod openrouter;
pub mod server;

pub use config::{Config, OpenRouterConfig, ServerConfig};
pub use error::{ErrorBody, RelayError, Result};
pub use models::{HealthResponse, ImageGenerationRequest, ImageGenerationResponse};
pub use openrouter::{HttpUpstream, ImageClient, ImageUpstream, UpstreamReply};
