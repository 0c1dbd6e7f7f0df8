//! Model-call abstraction.
//!
//! The pipeline talks to hosted language models through the [`ModelCaller`]
//! trait: one request in, one raw completion string out. OpenRouter is the
//! primary implementation.
//!
//! Supports multimodal content (text + images) for vision-capable models.

mod error;
mod openrouter;

pub use error::{classify_http_status, LlmError, LlmErrorKind, RetryConfig};
pub use openrouter::OpenRouterClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::image::ImageData;

/// Role in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Content part for multimodal messages (text or image).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content
    Text { text: String },
    /// Image URL content (for vision models)
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

/// Image URL wrapper for vision content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    /// Optional detail level: "auto", "low", or "high"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ContentPart {
    /// Create a text content part.
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Create an image URL content part.
    pub fn image_url(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: url.into(),
                detail: None,
            },
        }
    }
}

/// Message content - either simple text or multimodal (text + images).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content (most common case)
    Text(String),
    /// Multimodal content array (for vision models)
    Parts(Vec<ContentPart>),
}

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    /// Create a simple text message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        ChatMessage {
            role,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a user message carrying text plus a sequence of screenshots.
    pub fn user_with_images(text: impl Into<String>, images: &[ImageData]) -> Self {
        let mut parts = vec![ContentPart::text(text)];
        parts.extend(
            images
                .iter()
                .map(|img| ContentPart::image_url(img.to_data_url())),
        );
        ChatMessage {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }
}

/// Expected shape of the completion text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// The model is instructed to emit a single JSON object.
    Json,
    /// Free-form text.
    Text,
}

/// One model request: fixed instruction, screenshots, target model.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub images: Vec<ImageData>,
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: String,
    pub shape: ResponseShape,
}

impl ModelRequest {
    pub fn new(
        images: &[ImageData],
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        model: impl Into<String>,
        shape: ResponseShape,
    ) -> Self {
        Self {
            images: images.to_vec(),
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            model: model.into(),
            shape,
        }
    }
}

/// Trait for model callers.
///
/// Implementations own their own transport, timeout, and retry behavior;
/// every call must eventually resolve to a result rather than hang, otherwise
/// the owning fan-out slot stalls forever.
#[async_trait]
pub trait ModelCaller: Send + Sync {
    /// Execute one request and return the raw completion text.
    async fn ask(&self, request: &ModelRequest) -> Result<String, LlmError>;
}
