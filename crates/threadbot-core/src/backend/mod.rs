// ABOUTME: Completion backend trait: prompt text in, generated text out.
// ABOUTME: Implementations: OpenAiBackend (HTTP completions endpoint).

mod openai;

pub use openai::{OpenAiBackend, OpenAiConfig, DEFAULT_API_BASE};

use crate::error::Result;
use crate::params::CompletionParameters;
use async_trait::async_trait;
use serde::Serialize;

/// A single completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub top_p: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl CompletionRequest {
    /// Build a request from a thread's settings.
    pub fn from_settings(
        prompt: String,
        settings: &CompletionParameters,
        stop: Vec<String>,
    ) -> Self {
        Self {
            model: settings.model.as_str().to_string(),
            prompt,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            frequency_penalty: settings.frequency_penalty,
            presence_penalty: settings.presence_penalty,
            top_p: settings.top_p,
            stop,
        }
    }
}

/// Text generation service used by the conversation handler.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Return the text of the first completion choice.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}
