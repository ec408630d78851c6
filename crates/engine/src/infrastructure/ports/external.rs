//! External service port traits (clock, content generation, news lookup).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::{GenerationError, NewsError};

/// Clock abstraction so use cases can be tested with a fixed time.
#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// A prompt sent to the content generation service.
#[derive(Debug, Clone)]
pub struct ContentRequest {
    /// System prompt / role framing
    pub system_prompt: Option<String>,
    /// The user-level prompt body
    pub prompt: String,
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl ContentRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            prompt: prompt.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Raw generated text plus token accounting when the backend reports it.
#[derive(Debug, Clone)]
pub struct GeneratedContent {
    pub text: String,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

/// Port for the text generation backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentPort: Send + Sync {
    async fn generate(&self, request: ContentRequest) -> Result<GeneratedContent, GenerationError>;
}

/// One article returned by the news lookup.
#[derive(Debug, Clone)]
pub struct NewsArticle {
    pub title: String,
    pub description: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
}

/// Port for real-world event lookup, used by automatic prediction resolution.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsPort: Send + Sync {
    /// Search recent articles relevant to a query, newest first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<NewsArticle>, NewsError>;
}
