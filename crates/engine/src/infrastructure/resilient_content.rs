//! Resilient content client wrapper with exponential backoff retry
//!
//! Wraps any ContentPort implementation with retry logic to handle transient
//! failures. Non-retryable failures (auth, bad request) surface immediately
//! so use cases can fall back to deterministic content.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::ports::{
    ContentPort, ContentRequest, GeneratedContent, GenerationError,
};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries, just the initial attempt)
    pub max_retries: u32,
    /// Base delay in milliseconds before first retry
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (caps exponential growth)
    pub max_delay_ms: u64,
    /// Jitter factor (0.0-1.0) for randomizing delays to prevent thundering herd
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            jitter_factor: 0.2,
        }
    }
}

/// Wrapper that adds retry logic to any content client
pub struct ResilientContentClient {
    inner: Arc<dyn ContentPort>,
    config: RetryConfig,
}

impl ResilientContentClient {
    pub fn new(inner: Arc<dyn ContentPort>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Delay for a given attempt number: exponential backoff with jitter
    fn calculate_delay(&self, attempt: u32) -> u64 {
        let base = self.config.base_delay_ms;
        let exponential = base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exponential.min(self.config.max_delay_ms);

        let jitter_range = (capped as f64 * self.config.jitter_factor) as i64;
        if jitter_range > 0 {
            let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
            (capped as i64 + jitter).max(0) as u64
        } else {
            capped
        }
    }

    fn is_retryable(error: &GenerationError) -> bool {
        match error {
            GenerationError::RequestFailed(msg) => {
                // Don't retry on auth errors or bad requests
                !msg.contains("401") && !msg.contains("403") && !msg.contains("400")
            }
            // A malformed response may be a truncated body; worth one more try
            GenerationError::InvalidResponse(_) => true,
        }
    }
}

#[async_trait]
impl ContentPort for ResilientContentClient {
    async fn generate(&self, request: ContentRequest) -> Result<GeneratedContent, GenerationError> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.inner.generate(request.clone()).await {
                Ok(content) => {
                    if attempt > 0 {
                        tracing::info!(attempt = attempt + 1, "generation succeeded after retry");
                    }
                    return Ok(content);
                }
                Err(e) => {
                    let retryable = Self::is_retryable(&e);
                    if attempt < self.config.max_retries && retryable {
                        let delay = self.calculate_delay(attempt + 1);
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_retries = self.config.max_retries,
                            delay_ms = delay,
                            error = %e,
                            "generation failed, retrying"
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        last_error = Some(e);
                    } else {
                        if !retryable {
                            tracing::error!(error = %e, "generation failed with non-retryable error");
                        }
                        return Err(e);
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| GenerationError::RequestFailed("retries exhausted".to_string())))
    }
}
