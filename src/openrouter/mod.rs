pub mod image_client;
pub mod transport;
pub mod types;

pub use image_client::ImageClient;
pub use transport::{HttpUpstream, ImageUpstream, UpstreamReply};
pub use types::{
    extract_image_url, first_image_url, ChatCompletionRequest, ChatCompletionResponse, Modality,
};
