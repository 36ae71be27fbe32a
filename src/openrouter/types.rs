//! Wire types for the OpenRouter chat-completions endpoint.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RelayError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Image,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub modalities: Vec<Modality>,
}

impl ChatCompletionRequest {
    /// Single user turn that asks for image output, with text allowed alongside.
    pub fn image_prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(prompt)],
            modalities: vec![Modality::Image, Modality::Text],
        }
    }
}

// Each path segment is typed on its own and holds the next level as a raw
// `Value`, so a malformed sibling (a second choice, `content` as an array of
// parts, a later image) never hides a valid first image.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub images: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageEntry {
    #[serde(default)]
    pub image_url: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageUrl {
    #[serde(default)]
    pub url: Option<String>,
}

fn segment<T: DeserializeOwned>(value: &Value) -> Option<T> {
    T::deserialize(value).ok()
}

/// `choices[0].message.images[0].image_url.url`, when present and non-empty.
pub fn first_image_url(payload: &Value) -> Option<String> {
    let response: ChatCompletionResponse = segment(payload)?;
    let choices = response.choices?;
    let choice: Choice = segment(choices.first()?)?;
    let message: AssistantMessage = segment(&choice.message?)?;
    let images = message.images?;
    let entry: ImageEntry = segment(images.first()?)?;
    let image_url: ImageUrl = segment(&entry.image_url?)?;

    image_url.url.filter(|url| !url.is_empty())
}

/// Pulls the first image reference out of an upstream payload.
pub fn extract_image_url(payload: &Value) -> Result<String> {
    first_image_url(payload).ok_or_else(|| RelayError::MissingImage {
        raw: payload.clone(),
    })
}
