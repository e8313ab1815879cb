// ABOUTME: OpenAI text completions client implementing CompletionBackend.
// ABOUTME: Posts to {api_base}/completions with bearer auth and returns the first choice text.

use super::{CompletionBackend, CompletionRequest};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Connection settings for the OpenAI API.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub api_key: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// Client for the legacy text completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Backend("missing OpenAI API key".into()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|e| Error::Backend(format!("invalid API key header: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Backend(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        if base.ends_with("/completions") {
            return base.to_string();
        }
        format!("{base}/completions")
    }
}

/// Extract the first choice text from a completions response body.
fn parse_completion(raw: &str) -> Result<String> {
    let parsed: CompletionResponse = serde_json::from_str(raw)
        .map_err(|e| Error::Backend(format!("invalid completion response: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text)
        .ok_or_else(|| Error::Backend("completion response had no choices".into()))
}

fn parse_error(status: reqwest::StatusCode, raw: &str) -> Error {
    let detail = serde_json::from_str::<ApiErrorBody>(raw)
        .map(|body| body.error.message)
        .unwrap_or_else(|_| raw.to_string());
    Error::Backend(format!("HTTP {status}: {detail}"))
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        debug!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            max_tokens = request.max_tokens,
            "Requesting completion"
        );

        let response = self
            .client
            .post(self.completions_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Backend(e.to_string()))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| Error::Backend(e.to_string()))?;

        if !status.is_success() {
            return Err(parse_error(status, &raw));
        }

        parse_completion(&raw)
    }
}
