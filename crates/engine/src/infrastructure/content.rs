//! Content generation client (OpenAI-compatible chat completions API)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::infrastructure::ports::{
    ContentPort, ContentRequest, GeneratedContent, GenerationError,
};

/// Client for an OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

/// Default base URL (a local inference server).
pub const DEFAULT_COMPLETION_BASE_URL: &str = "http://localhost:11434";

/// Default model.
pub const DEFAULT_COMPLETION_MODEL: &str = "llama3.1:8b";

impl CompletionClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        // 30 second timeout; generation requests should fail fast enough for
        // the deterministic fallback to keep the lifecycle moving
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Create client from environment variables.
    ///
    /// Uses `COMPLETION_BASE_URL`, `COMPLETION_MODEL` and `COMPLETION_API_KEY`,
    /// falling back to defaults if not set.
    pub fn from_env() -> Self {
        let base_url = std::env::var("COMPLETION_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_COMPLETION_BASE_URL.to_string());
        let model = std::env::var("COMPLETION_MODEL")
            .unwrap_or_else(|_| DEFAULT_COMPLETION_MODEL.to_string());
        let mut client = Self::new(&base_url, &model);
        if let Ok(api_key) = std::env::var("COMPLETION_API_KEY") {
            client = client.with_api_key(api_key);
        }
        client
    }
}

impl Default for CompletionClient {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETION_BASE_URL, DEFAULT_COMPLETION_MODEL)
    }
}

#[async_trait]
impl ContentPort for CompletionClient {
    async fn generate(&self, request: ContentRequest) -> Result<GeneratedContent, GenerationError> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(ApiMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ApiMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        let api_request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut http_request = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&api_request);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;
            return Err(GenerationError::RequestFailed(error_text));
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::InvalidResponse("no choices in response".to_string()))?;

        Ok(GeneratedContent {
            text: choice.message.content,
            prompt_tokens: api_response.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: api_response.usage.as_ref().map(|u| u.completion_tokens),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
